//! Full-screen image overlays.
//!
//! Every screen the booth shows is an image overlay on top of the camera
//! preview. [`OverlayManager`] owns the lifecycle of those overlays so that
//! each one is removed exactly once.

mod manager;
mod pad;

pub use manager::{OverlayHandle, OverlayManager};
pub use pad::{load_padded, pad_image, padded_dimensions, HEIGHT_BLOCK, WIDTH_BLOCK};

use crate::hardware::CameraError;
use std::path::PathBuf;
use thiserror::Error;

/// Layer used for single full-screen prompts and backgrounds.
pub const SCREEN_LAYER: i32 = 3;
/// Layer stacked above [`SCREEN_LAYER`] for blinking prompts.
pub const PROMPT_LAYER: i32 = 4;

/// Fully opaque.
pub const OPAQUE: u8 = 255;
/// Fully transparent.
pub const TRANSPARENT: u8 = 0;

/// Errors that can occur while showing or removing overlays.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// The image file could not be read or decoded.
    #[error("failed to load overlay image {}: {reason}", path.display())]
    Load {
        /// Image file.
        path: PathBuf,
        /// Decoder message.
        reason: String,
    },
    /// The camera refused the overlay operation.
    #[error(transparent)]
    Camera(#[from] CameraError),
}
