use thiserror::Error;

/// No display could be resolved for a virtual-desktop point.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("No monitor found at ({x}, {y})")]
pub struct MonitorNotFound {
    pub x: i32,
    pub y: i32,
}

/// Failure of a single acquisition strategy. Recovered by the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquireError {
    #[error("Accelerated capture unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("No frame delivered within {ms}ms")]
    Timeout { ms: u64 },

    #[error("Platform error: {reason}")]
    Platform { reason: String },

    #[error("Invalid frame: {reason}")]
    InvalidFrame { reason: String },

    #[error("Frame source closed before delivering a frame")]
    Closed,
}

impl AcquireError {
    pub fn platform(reason: impl std::fmt::Display) -> Self {
        Self::Platform {
            reason: reason.to_string(),
        }
    }

    pub fn unavailable(reason: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            reason: reason.to_string(),
        }
    }
}

/// Both acquisition strategies failed; terminal for one capture attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Capture failed: {legacy}")]
    Failed {
        accelerated: AcquireError,
        legacy: AcquireError,
    },
}

/// Malformed frame-spec text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecParseError {
    #[error("Frame spec is empty")]
    Empty,

    #[error("Frame spec '{input}' is not W:H or WxH")]
    Malformed { input: String },

    #[error("Frame spec '{input}' must use whole numbers greater than zero")]
    NonPositive { input: String },
}
