//! Camera abstraction for preview, stills and screen overlays.
//!
//! This module provides a trait-based abstraction over the camera driver,
//! allowing for both real camera hardware and mock implementations for
//! testing.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Creates a resolution.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Identifier the driver assigns to an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OverlayId(
    /// Raw driver handle.
    pub u32,
);

/// RGB pixel buffer padded to the driver's block alignment.
///
/// `pixels` covers the full `padded` area; only the `visible` region is
/// shown on screen.
#[derive(Clone)]
pub struct OverlayImage {
    /// Packed RGB bytes, `padded.width * padded.height * 3` long.
    pub pixels: Vec<u8>,
    /// Dimensions of the pixel buffer.
    pub padded: Resolution,
    /// Dimensions of the original image.
    pub visible: Resolution,
}

impl std::fmt::Debug for OverlayImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayImage")
            .field("padded", &self.padded)
            .field("visible", &self.visible)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}

/// Settings applied when the camera is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraSettings {
    /// Still capture resolution.
    pub resolution: Resolution,
    /// Sensor rotation in degrees.
    pub rotation: u16,
    /// Annotation text size.
    pub annotation_size: u8,
}

/// Errors that can occur during camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    /// The camera could not be acquired.
    #[error("failed to open camera: {0}")]
    OpenFailed(String),
    /// A call that needs an open camera.
    #[error("camera not initialized")]
    NotInitialized,
    /// The still could not be taken or saved.
    #[error("failed to capture still to {}: {reason}", path.display())]
    CaptureFailed {
        /// Intended output file.
        path: PathBuf,
        /// Driver message.
        reason: String,
    },
    /// The id does not name a live overlay.
    #[error("unknown overlay {0:?}")]
    UnknownOverlay(OverlayId),
    /// The driver refused the pixel buffer.
    #[error("overlay rejected: {0}")]
    OverlayRejected(String),
}

/// Trait for camera implementations.
pub trait Camera {
    /// Acquires and initializes the camera.
    fn open(&mut self, settings: &CameraSettings) -> Result<(), CameraError>;

    /// Checks if the camera is currently open.
    fn is_open(&self) -> bool;

    /// Starts the full-screen live preview.
    fn start_preview(&mut self, resolution: Resolution) -> Result<(), CameraError>;

    /// Stops the live preview. Safe to call when no preview is running.
    fn stop_preview(&mut self);

    /// Sets the still capture resolution.
    fn set_resolution(&mut self, resolution: Resolution) -> Result<(), CameraError>;

    /// Sets the text drawn over the preview; empty clears it.
    fn set_annotation(&mut self, text: &str) -> Result<(), CameraError>;

    /// Captures a still image to `path`.
    fn capture_still(&mut self, path: &Path) -> Result<(), CameraError>;

    /// Adds a full-screen overlay and returns its id.
    fn add_overlay(&mut self, image: &OverlayImage) -> Result<OverlayId, CameraError>;

    /// Removes an overlay.
    fn remove_overlay(&mut self, id: OverlayId) -> Result<(), CameraError>;

    /// Changes the opacity of a live overlay.
    fn set_overlay_alpha(&mut self, id: OverlayId, alpha: u8) -> Result<(), CameraError>;

    /// Changes the z-order of a live overlay.
    fn set_overlay_layer(&mut self, id: OverlayId, layer: i32) -> Result<(), CameraError>;
}

/// A call observed by [`MockCamera`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraEvent {
    /// `open` succeeded.
    Opened,
    /// Capture resolution changed.
    ResolutionSet(Resolution),
    /// Preview started at this resolution.
    PreviewStarted(Resolution),
    /// `stop_preview` was called.
    PreviewStopped,
    /// Annotation text set; empty clears it.
    Annotation(String),
    /// A still was written here.
    Captured(PathBuf),
    /// An overlay was added.
    OverlayAdded {
        /// Assigned id.
        id: OverlayId,
        /// Visible size of the image.
        visible: Resolution,
    },
    /// An overlay was moved to a layer.
    OverlayLayer {
        /// Overlay id.
        id: OverlayId,
        /// New z-order.
        layer: i32,
    },
    /// An overlay's opacity changed.
    OverlayAlpha {
        /// Overlay id.
        id: OverlayId,
        /// New opacity.
        alpha: u8,
    },
    /// An overlay was removed.
    OverlayRemoved(OverlayId),
}

#[derive(Debug, Clone, Copy)]
struct MockOverlay {
    layer: i32,
    alpha: u8,
}

/// Mock camera that writes synthetic JPEG stills and tracks overlays.
///
/// Every call is recorded as a [`CameraEvent`]. Opening and individual
/// captures can be made to fail.
#[derive(Debug, Default)]
pub struct MockCamera {
    settings: Option<CameraSettings>,
    preview: Option<Resolution>,
    annotation: String,
    overlays: BTreeMap<OverlayId, MockOverlay>,
    next_overlay: u32,
    captures: usize,
    fail_open: Option<String>,
    fail_capture_at: Option<usize>,
    events: Vec<CameraEvent>,
}

impl MockCamera {
    /// A closed mock camera that never fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `open` fail with the given reason.
    pub fn failing_open(reason: impl Into<String>) -> Self {
        Self {
            fail_open: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Makes the `n`-th capture (1-based) fail.
    pub fn fail_capture_at(mut self, n: usize) -> Self {
        self.fail_capture_at = Some(n);
        self
    }

    /// All recorded calls in order.
    pub fn events(&self) -> &[CameraEvent] {
        &self.events
    }

    /// Number of recorded events matching `predicate`.
    pub fn count_events(&self, predicate: impl Fn(&CameraEvent) -> bool) -> usize {
        self.events.iter().filter(|e| predicate(e)).count()
    }

    /// Paths of every successful capture.
    pub fn captured(&self) -> Vec<PathBuf> {
        self.events
            .iter()
            .filter_map(|e| match e {
                CameraEvent::Captured(path) => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of overlays currently on screen.
    pub fn live_overlays(&self) -> usize {
        self.overlays.len()
    }

    /// Opacity of a live overlay.
    pub fn overlay_alpha(&self, id: OverlayId) -> Option<u8> {
        self.overlays.get(&id).map(|o| o.alpha)
    }

    /// Layer of a live overlay.
    pub fn overlay_layer(&self, id: OverlayId) -> Option<i32> {
        self.overlays.get(&id).map(|o| o.layer)
    }

    /// Returns true while the preview is running.
    pub fn preview_active(&self) -> bool {
        self.preview.is_some()
    }

    /// Current annotation text.
    pub fn annotation(&self) -> &str {
        &self.annotation
    }

    fn settings(&self) -> Result<&CameraSettings, CameraError> {
        self.settings.as_ref().ok_or(CameraError::NotInitialized)
    }

    fn overlay_mut(&mut self, id: OverlayId) -> Result<&mut MockOverlay, CameraError> {
        self.settings()?;
        self.overlays
            .get_mut(&id)
            .ok_or(CameraError::UnknownOverlay(id))
    }
}

impl Camera for MockCamera {
    fn open(&mut self, settings: &CameraSettings) -> Result<(), CameraError> {
        if let Some(reason) = &self.fail_open {
            return Err(CameraError::OpenFailed(reason.clone()));
        }
        self.settings = Some(settings.clone());
        self.events.push(CameraEvent::Opened);
        tracing::info!("MockCamera opened with settings: {:?}", settings);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.settings.is_some()
    }

    fn start_preview(&mut self, resolution: Resolution) -> Result<(), CameraError> {
        self.settings()?;
        self.preview = Some(resolution);
        self.events.push(CameraEvent::PreviewStarted(resolution));
        Ok(())
    }

    fn stop_preview(&mut self) {
        self.preview = None;
        self.events.push(CameraEvent::PreviewStopped);
    }

    fn set_resolution(&mut self, resolution: Resolution) -> Result<(), CameraError> {
        let settings = self.settings.as_mut().ok_or(CameraError::NotInitialized)?;
        settings.resolution = resolution;
        self.events.push(CameraEvent::ResolutionSet(resolution));
        Ok(())
    }

    fn set_annotation(&mut self, text: &str) -> Result<(), CameraError> {
        self.settings()?;
        self.annotation = text.to_owned();
        self.events.push(CameraEvent::Annotation(text.to_owned()));
        Ok(())
    }

    fn capture_still(&mut self, path: &Path) -> Result<(), CameraError> {
        let resolution = self.settings()?.resolution;
        self.captures += 1;

        if self.fail_capture_at == Some(self.captures) {
            return Err(CameraError::CaptureFailed {
                path: path.to_path_buf(),
                reason: "simulated sensor fault".into(),
            });
        }

        // Deterministic gradient, different per capture
        let shade = (self.captures * 40 % 256) as u8;
        let still = image::RgbImage::from_fn(resolution.width, resolution.height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, shade])
        });
        still
            .save_with_format(path, image::ImageFormat::Jpeg)
            .map_err(|e| CameraError::CaptureFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        self.events.push(CameraEvent::Captured(path.to_path_buf()));
        Ok(())
    }

    fn add_overlay(&mut self, image: &OverlayImage) -> Result<OverlayId, CameraError> {
        self.settings()?;
        let expected = (image.padded.width * image.padded.height * 3) as usize;
        if image.pixels.len() != expected {
            return Err(CameraError::OverlayRejected(format!(
                "buffer holds {} bytes, {} padded to {} needs {}",
                image.pixels.len(),
                image.visible,
                image.padded,
                expected
            )));
        }
        if image.padded.width % 32 != 0 || image.padded.height % 16 != 0 {
            return Err(CameraError::OverlayRejected(format!(
                "{} is not block aligned",
                image.padded
            )));
        }

        self.next_overlay += 1;
        let id = OverlayId(self.next_overlay);
        self.overlays.insert(id, MockOverlay { layer: 0, alpha: 255 });
        self.events.push(CameraEvent::OverlayAdded {
            id,
            visible: image.visible,
        });
        Ok(id)
    }

    fn remove_overlay(&mut self, id: OverlayId) -> Result<(), CameraError> {
        self.settings()?;
        self.overlays
            .remove(&id)
            .ok_or(CameraError::UnknownOverlay(id))?;
        self.events.push(CameraEvent::OverlayRemoved(id));
        Ok(())
    }

    fn set_overlay_alpha(&mut self, id: OverlayId, alpha: u8) -> Result<(), CameraError> {
        self.overlay_mut(id)?.alpha = alpha;
        self.events.push(CameraEvent::OverlayAlpha { id, alpha });
        Ok(())
    }

    fn set_overlay_layer(&mut self, id: OverlayId, layer: i32) -> Result<(), CameraError> {
        self.overlay_mut(id)?.layer = layer;
        self.events.push(CameraEvent::OverlayLayer { id, layer });
        Ok(())
    }
}
