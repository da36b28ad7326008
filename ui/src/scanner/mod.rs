//! Camera/scanner lifecycle: the state machine, the decoder engines it
//! drives, and the glue to the `rqrr` decoder.

pub mod controller;
pub mod decode;
pub mod engine;
pub mod error;
pub mod host;
#[cfg(not(target_arch = "wasm32"))]
pub mod native_engine;
pub mod platform;
pub mod session;
pub mod settings;
#[cfg(target_arch = "wasm32")]
pub mod web_engine;

pub use controller::{ScanCommand, ScanController};
pub use engine::{DecoderEngine, ImageFile};
pub use error::{EngineError, ScanError};
pub use session::{Facing, ScanSession, ScanState};
pub use settings::ScannerSettings;
