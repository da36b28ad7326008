//=============================================================================
// File: src/hooks/use_scan_controller.rs
//=============================================================================

use dioxus::prelude::*;

use crate::scanner::host::DeviceHaptics;
use crate::scanner::platform::{PlatformCommand, PlatformEngine};
use crate::scanner::{ScanController, ScanSession, ScannerSettings};

/// The view's handle on a running scanner: a reactive snapshot to render
/// from, and a way to send commands.
#[derive(Clone, Copy)]
pub struct ScannerHandle {
    session: Signal<ScanSession>,
    commands: Coroutine<PlatformCommand>,
}

impl ScannerHandle {
    /// Call `.read()` on this in a component to subscribe to changes.
    pub fn session(&self) -> Signal<ScanSession> {
        self.session
    }

    pub fn send(&self, command: PlatformCommand) {
        self.commands.send(command);
    }
}

/// Creates one scanner for the lifetime of the calling component.
///
/// The controller (and with it the engine and any camera stream) lives inside
/// a coroutine owned by the component. Unmounting drops the coroutine, and the
/// controller's `Drop` releases the camera, whatever state it was in.
pub fn use_scan_controller(settings: ScannerSettings) -> ScannerHandle {
    let initial_facing = settings.initial_facing;
    let session = use_signal(|| ScanSession::new(initial_facing));

    let commands = use_coroutine(move |rx: UnboundedReceiver<PlatformCommand>| {
        let settings = settings.clone();
        let mut session = session;
        async move {
            let controller = ScanController::new(PlatformEngine::new(), DeviceHaptics, settings)
                .with_observer(move |snapshot| session.set(snapshot.clone()));
            controller.run(rx).await;
            dioxus_logger::tracing::debug!("scanner loop finished");
        }
    });

    ScannerHandle { session, commands }
}
