//! Picks the engine for the build target, following the same
//! `wasm32` / native split as `compat`.

use dioxus::prelude::*;

use super::controller::{ScanCommand, ScanController};
use super::engine::DecoderEngine;
use super::host::DeviceHaptics;

#[cfg(target_arch = "wasm32")]
pub use super::web_engine::WebDecoderEngine as PlatformEngine;

#[cfg(not(target_arch = "wasm32"))]
pub use super::native_engine::StillImageEngine as PlatformEngine;

pub type PlatformSurface = <PlatformEngine as DecoderEngine>::Surface;
pub type PlatformController = ScanController<PlatformEngine, DeviceHaptics>;
pub type PlatformCommand = ScanCommand<PlatformSurface>;

/// Turns the preview element's mount event into an engine surface.
#[cfg(target_arch = "wasm32")]
pub fn surface_from_mounted(mounted: &MountedData) -> Option<PlatformSurface> {
    use wasm_bindgen::JsCast;

    mounted
        .downcast::<web_sys::Element>()
        .and_then(|element| element.clone().dyn_into::<web_sys::HtmlVideoElement>().ok())
}

#[cfg(not(target_arch = "wasm32"))]
pub fn surface_from_mounted(_mounted: &MountedData) -> Option<PlatformSurface> {
    Some(())
}
