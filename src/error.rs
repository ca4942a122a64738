//! Crate-level error type.

use crate::hardware::{CameraError, GpioError};
use crate::overlay::OverlayError;
use std::path::PathBuf;
use thiserror::Error;

/// Reasons the booth stops before entering its main loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartupAbort {
    /// The button read low at boot.
    #[error("the button was pressed during start up")]
    ButtonHeld,
    /// The camera failed to open.
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),
}

/// Errors that end a booth run.
///
/// Nothing below the controller recovers from these; they propagate to the
/// single outer boundary, which logs them and runs the shutdown sequence.
#[derive(Debug, Error)]
pub enum BoothError {
    /// Digital I/O failure.
    #[error("gpio: {0}")]
    Gpio(#[from] GpioError),
    /// Camera failure.
    #[error("camera: {0}")]
    Camera(#[from] CameraError),
    /// Overlay load or display failure.
    #[error("overlay: {0}")]
    Overlay(#[from] OverlayError),
    /// A photo file operation failed.
    #[error("file operation on {} failed: {source}", path.display())]
    Io {
        /// File being written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The operator interrupt was raised.
    #[error("interrupted by operator")]
    Interrupted,
    /// Startup stopped before the main loop.
    #[error("aborted at startup: {0}")]
    StartupAborted(StartupAbort),
}
