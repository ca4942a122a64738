//! Guest sessions and the booth's control loop.
//!
//! [`SessionController`] waits for the button and hands each press to a
//! [`CaptureSequencer`], which runs one guest's photos from the first
//! "get ready" screen to the final "all done".

mod controller;
mod led;
mod sequencer;

pub use controller::{RunOutcome, SessionController};
pub use led::{BlinkTimer, Led, LedPhase};
pub use sequencer::{countdown_text, CaptureSequencer};

use crate::clock::Clock;
use crate::hardware::{Camera, DigitalIo};
use crate::overlay::OverlayManager;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

/// The devices a run drives, all used from the single control thread.
pub struct Peripherals<G: DigitalIo, C: Camera, K: Clock> {
    /// Button and LED.
    pub gpio: G,
    /// The camera, wrapped with the live overlay registry.
    pub overlays: OverlayManager<C>,
    /// Time source for every delay.
    pub clock: K,
}

impl<G: DigitalIo, C: Camera, K: Clock> Peripherals<G, C, K> {
    /// Bundles the devices; no overlays are live yet.
    pub fn new(gpio: G, camera: C, clock: K) -> Self {
        Self {
            gpio,
            overlays: OverlayManager::new(camera),
            clock,
        }
    }
}

/// One guest's photos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    filename_prefix: String,
    photo_count: u32,
    captured_paths: Vec<PathBuf>,
}

impl Session {
    /// Starts a session whose files are named after `started_at`.
    pub fn begin(started_at: NaiveDateTime, photo_count: u32) -> Self {
        Self {
            filename_prefix: filename_prefix(started_at),
            photo_count,
            captured_paths: Vec::with_capacity(photo_count as usize),
        }
    }

    /// Timestamp prefix shared by every file of the session.
    pub fn filename_prefix(&self) -> &str {
        &self.filename_prefix
    }

    /// Photos this session will take.
    pub fn photo_count(&self) -> u32 {
        self.photo_count
    }

    /// Captured files so far, in capture order.
    pub fn captured_paths(&self) -> &[PathBuf] {
        &self.captured_paths
    }

    /// File name for photo `n` (1-based), e.g. `2017-12-31_23-59-59_1of3.jpg`.
    pub fn photo_file_name(&self, n: u32) -> String {
        format!("{}_{}of{}.jpg", self.filename_prefix, n, self.photo_count)
    }

    /// Returns true once every photo has been captured.
    pub fn is_complete(&self) -> bool {
        self.captured_paths.len() == self.photo_count as usize
    }

    pub(crate) fn record(&mut self, path: &Path) {
        self.captured_paths.push(path.to_path_buf());
    }
}

/// Filename prefix for a session started at `at`, to the second.
pub fn filename_prefix(at: NaiveDateTime) -> String {
    sanitize_prefix(&at.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Replaces characters that are awkward or invalid in file names.
pub fn sanitize_prefix(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            ' ' => '_',
            ':' | '/' | '\\' => '-',
            c => c,
        })
        .collect()
}
