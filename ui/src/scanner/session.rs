//! The state held by a scanner between commands.

use std::str::FromStr;

/// Which physical camera is requested.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, strum::EnumIs)]
pub enum Facing {
    /// The user-facing ("selfie") camera.
    Front,
    /// The environment-facing camera. Preferred for scanning.
    #[default]
    Back,
}

impl Facing {
    /// The `facingMode` value understood by `getUserMedia`.
    pub fn facing_mode(&self) -> &'static str {
        match self {
            Facing::Front => "user",
            Facing::Back => "environment",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Facing::Front => "Front camera",
            Facing::Back => "Back camera",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Facing::Front => Facing::Back,
            Facing::Back => Facing::Front,
        }
    }
}

impl FromStr for Facing {
    type Err = String;

    /// Accepts both our names and the `facingMode` names, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "front" | "user" => Ok(Facing::Front),
            "back" | "rear" | "environment" => Ok(Facing::Back),
            other => Err(format!("unknown camera facing: {}", other)),
        }
    }
}

/// States of the scanner lifecycle.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, strum::EnumIs)]
pub enum ScanState {
    #[default]
    Idle,
    /// Waiting for the camera (and possibly a permission prompt).
    Starting,
    Scanning,
    /// Waiting for the engine to release the camera.
    Stopping,
    /// The last attach failed. Not terminal: a new start retries.
    Error,
}

/// Snapshot of everything the view needs to render the scanner.
///
/// `is_scanning` is true exactly while the engine holds a live stream. It is
/// tracked separately from `state` because the stream is still held while
/// `Stopping`.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct ScanSession {
    pub state: ScanState,
    pub is_scanning: bool,
    pub facing: Facing,
    pub last_result: Option<String>,
    pub last_error: Option<String>,
}

impl ScanSession {
    pub fn new(facing: Facing) -> Self {
        Self {
            facing,
            ..Default::default()
        }
    }

    /// True while a camera transition is in flight and controls should be disabled.
    pub fn is_busy(&self) -> bool {
        self.state.is_starting() || self.state.is_stopping()
    }

    pub(crate) fn clear_outcome(&mut self) {
        self.last_result = None;
        self.last_error = None;
    }
}
