use thiserror::Error;

/// Failures reported by a [`DecoderEngine`](super::engine::DecoderEngine).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("camera permission was denied")]
    PermissionDenied,

    #[error("no camera satisfies the requested constraints")]
    ConstraintUnsatisfied,

    #[error("camera is unavailable: {0}")]
    Unavailable(String),

    #[error("no QR code found")]
    NoCode,

    #[error("image could not be read: {0}")]
    InvalidImage(String),

    #[error("{0}")]
    Platform(String),
}

/// The scanner's error taxonomy.
///
/// Only [`ScanError::CameraAccess`] and [`ScanError::ImageDecode`] ever reach
/// the user. The other two are absorbed where they happen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// Permission denied, device unavailable or constraint unsatisfiable.
    #[error("Could not access the camera: {0}")]
    CameraAccess(EngineError),

    /// A still image had no readable code. The message is deliberately generic.
    #[error("Could not process the image. Make sure it contains a clear QR code.")]
    ImageDecode(EngineError),

    /// A live frame without a code. Not an error from the user's point of view.
    #[error("frame skipped: {0}")]
    TransientFrame(String),

    /// Releasing the camera failed.
    #[error("camera release failed: {0}")]
    Cleanup(EngineError),
}

impl ScanError {
    pub fn is_user_visible(&self) -> bool {
        matches!(self, ScanError::CameraAccess(_) | ScanError::ImageDecode(_))
    }
}
