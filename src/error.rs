//! Error types

use thiserror::Error;

/// Capture device could not be configured or started.
///
/// Fatal to session start and never retried automatically.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Camera input unavailable: {0}")]
    InputUnavailable(String),
    #[error("Camera output unavailable: {0}")]
    OutputUnavailable(String),
    #[error("Failed to spawn capture thread: {0}")]
    ThreadSpawn(String),
}

/// Per-frame detector failure. Treated as an empty observation set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DetectionError {
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("No observation in frame")]
    NoObservation,
}

/// Display geometry that cannot produce a proper display rectangle.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Degenerate image size {width}x{height}")]
    DegenerateImage { width: f64, height: f64 },
    #[error("Degenerate view bounds {width}x{height}")]
    DegenerateView { width: f64, height: f64 },
}

/// Errors surfaced by the capture session lifecycle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
    #[error("Capture session is closed")]
    Closed,
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
