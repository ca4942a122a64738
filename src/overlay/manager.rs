//! Overlay lifecycle on top of the camera's overlay primitive.

use super::{pad, OverlayError, OPAQUE};
use crate::clock::Clock;
use crate::hardware::{Camera, OverlayId};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// A live on-screen overlay.
///
/// Handles are neither `Clone` nor `Copy`: whoever holds one is the only
/// party that can remove it, and removal consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct OverlayHandle {
    id: OverlayId,
    layer: i32,
    alpha: u8,
}

impl OverlayHandle {
    /// Driver id of the overlay.
    #[inline]
    pub fn id(&self) -> OverlayId {
        self.id
    }

    /// Z-order the overlay was shown at.
    #[inline]
    pub fn layer(&self) -> i32 {
        self.layer
    }

    /// Last opacity set through the manager.
    #[inline]
    pub fn alpha(&self) -> u8 {
        self.alpha
    }
}

/// Owns the camera and every overlay shown on it.
///
/// The manager keeps its own registry of live overlays. Hiding an overlay
/// the registry no longer knows about is a no-op, which makes
/// [`OverlayManager::hide_all`] safe to run after any partial sequence.
pub struct OverlayManager<C: Camera> {
    camera: C,
    live: BTreeMap<OverlayId, i32>,
    shown: u64,
    hidden: u64,
}

impl<C: Camera> OverlayManager<C> {
    /// Wraps a camera. No overlays are live initially.
    pub fn new(camera: C) -> Self {
        Self {
            camera,
            live: BTreeMap::new(),
            shown: 0,
            hidden: 0,
        }
    }

    /// Returns the underlying camera.
    pub fn camera(&self) -> &C {
        &self.camera
    }

    /// Returns the underlying camera mutably, for preview, capture and
    /// annotation calls.
    pub fn camera_mut(&mut self) -> &mut C {
        &mut self.camera
    }

    /// Loads, pads and displays an image at `layer`.
    pub fn show(&mut self, image_path: &Path, layer: i32) -> Result<OverlayHandle, OverlayError> {
        let image = pad::load_padded(image_path)?;
        let id = self.camera.add_overlay(&image)?;

        if let Err(e) = self.camera.set_overlay_layer(id, layer) {
            // Never leave an overlay on screen that nobody holds a handle to
            if let Err(remove_err) = self.camera.remove_overlay(id) {
                tracing::warn!(?id, error = %remove_err, "Failed to remove unlayered overlay");
            }
            return Err(e.into());
        }

        self.live.insert(id, layer);
        self.shown += 1;

        tracing::debug!(
            ?id,
            layer,
            visible = %image.visible,
            padded = %image.padded,
            path = %image_path.display(),
            "Overlay shown"
        );

        Ok(OverlayHandle {
            id,
            layer,
            alpha: OPAQUE,
        })
    }

    /// Shows an image for `duration`, then removes it before returning.
    pub fn show_for<K: Clock>(
        &mut self,
        clock: &mut K,
        image_path: &Path,
        layer: i32,
        duration: Duration,
    ) -> Result<(), OverlayError> {
        let handle = self.show(image_path, layer)?;
        clock.sleep(duration);
        self.remove(handle)
    }

    /// Removes the overlay in `slot`, if any, leaving the slot empty.
    pub fn hide(&mut self, slot: &mut Option<OverlayHandle>) -> Result<(), OverlayError> {
        match slot.take() {
            Some(handle) => self.remove(handle),
            None => Ok(()),
        }
    }

    /// Changes the opacity of a live overlay in place.
    pub fn set_alpha(&mut self, handle: &mut OverlayHandle, alpha: u8) -> Result<(), OverlayError> {
        if !self.live.contains_key(&handle.id) {
            tracing::debug!(id = ?handle.id, "Alpha change on an overlay already removed");
            return Ok(());
        }
        self.camera.set_overlay_alpha(handle.id, alpha)?;
        handle.alpha = alpha;
        Ok(())
    }

    /// Removes every live overlay. Returns how many were removed.
    ///
    /// Driver failures are logged, not returned: this runs on the shutdown
    /// path where there is nobody left to handle them.
    pub fn hide_all(&mut self) -> usize {
        let ids: Vec<OverlayId> = self.live.keys().copied().collect();
        for id in &ids {
            self.live.remove(id);
            self.hidden += 1;
            if let Err(e) = self.camera.remove_overlay(*id) {
                tracing::warn!(?id, error = %e, "Failed to remove overlay during cleanup");
            }
        }
        ids.len()
    }

    /// Number of overlays currently on screen.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Total overlays successfully shown.
    pub fn shown_count(&self) -> u64 {
        self.shown
    }

    /// Total overlays removed, including by `show_for` and `hide_all`.
    pub fn hidden_count(&self) -> u64 {
        self.hidden
    }

    fn remove(&mut self, handle: OverlayHandle) -> Result<(), OverlayError> {
        if self.live.remove(&handle.id).is_none() {
            return Ok(());
        }
        self.hidden += 1;
        self.camera.remove_overlay(handle.id)?;
        tracing::debug!(id = ?handle.id, layer = handle.layer, "Overlay hidden");
        Ok(())
    }
}
