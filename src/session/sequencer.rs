//! One guest's capture and playback sequence.
//!
//! The sequence is strictly linear:
//!
//! ```text
//! for each photo: get ready → countdown → capture (→ backup copy)
//! processing → playback → all done
//! ```
//!
//! Every blocking step is followed by an interrupt check. Failures are not
//! recovered here; they propagate to the controller.

use super::led::{Led, LedPhase};
use super::{Peripherals, Session};
use crate::clock::Clock;
use crate::config::BoothConfig;
use crate::error::BoothError;
use crate::hardware::{Camera, DigitalIo};
use crate::interrupt::Interrupt;
use crate::overlay::{OverlayHandle, SCREEN_LAYER};
use crate::storage::StorageTarget;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Half of one countdown second: LED on, then LED off.
const COUNTDOWN_HALF_TICK: Duration = Duration::from_millis(500);

/// Annotation shown during the countdown.
pub fn countdown_text(remaining: u32) -> String {
    format!("             ...{remaining}")
}

/// Runs the capture sequence for one button press.
pub struct CaptureSequencer<'a> {
    config: &'a BoothConfig,
    storage: &'a StorageTarget,
    interrupt: &'a Interrupt,
    led: Led,
}

impl<'a> CaptureSequencer<'a> {
    /// Sequencer for one button press, writing into `storage`.
    pub fn new(config: &'a BoothConfig, storage: &'a StorageTarget, interrupt: &'a Interrupt) -> Self {
        Self {
            config,
            storage,
            interrupt,
            led: Led::new(config.gpio.led_pin, config.gpio.led_flashing),
        }
    }

    /// Captures `photo_count` photos, plays them back and returns the
    /// completed session.
    pub fn run_session<G, C, K>(&self, rig: &mut Peripherals<G, C, K>) -> Result<Session, BoothError>
    where
        G: DigitalIo,
        C: Camera,
        K: Clock,
    {
        let mut session = Session::begin(rig.clock.now(), self.config.capture.photo_count);
        info!(prefix = session.filename_prefix(), "Session started");

        for n in 1..=session.photo_count() {
            self.prepare(rig, n)?;
            let path = self.take_photo(rig, &session, n)?;
            session.record(&path);
        }

        self.processing(rig)?;
        self.playback(rig, &session)?;
        self.finished(rig)?;

        Ok(session)
    }

    fn prepare<G: DigitalIo, C: Camera, K: Clock>(
        &self,
        rig: &mut Peripherals<G, C, K>,
        n: u32,
    ) -> Result<(), BoothError> {
        let image = self.config.assets.get_ready(n);
        rig.overlays
            .show_for(&mut rig.clock, &image, SCREEN_LAYER, self.config.timing.prep_delay())?;
        self.interrupt.check()
    }

    fn take_photo<G: DigitalIo, C: Camera, K: Clock>(
        &self,
        rig: &mut Peripherals<G, C, K>,
        session: &Session,
        n: u32,
    ) -> Result<PathBuf, BoothError> {
        let file_name = session.photo_file_name(n);
        let path = self.storage.primary_path().join(&file_name);

        for remaining in (1..=self.config.timing.countdown_secs).rev() {
            rig.overlays.camera_mut().set_annotation(&countdown_text(remaining))?;
            self.led.show(&mut rig.gpio, LedPhase::Countdown { lit: true })?;
            rig.clock.sleep(COUNTDOWN_HALF_TICK);
            self.led.show(&mut rig.gpio, LedPhase::Countdown { lit: false })?;
            rig.clock.sleep(COUNTDOWN_HALF_TICK);
            self.interrupt.check()?;
        }

        self.led.show(&mut rig.gpio, LedPhase::CaptureFlash)?;
        let captured = self.capture(rig, &path, &file_name, n);
        // The flash goes dark whether or not the capture worked
        self.led.show(&mut rig.gpio, LedPhase::Off)?;
        captured?;

        Ok(path)
    }

    fn capture<G: DigitalIo, C: Camera, K: Clock>(
        &self,
        rig: &mut Peripherals<G, C, K>,
        path: &Path,
        file_name: &str,
        n: u32,
    ) -> Result<(), BoothError> {
        let camera = rig.overlays.camera_mut();
        camera.set_annotation("")?;
        camera.capture_still(path)?;
        info!(photo = n, path = %path.display(), "Photo ({}) saved: {}", n, path.display());

        if let Some(backup_dir) = self.storage.backup_path() {
            let backup = backup_dir.join(file_name);
            fs::copy(path, &backup).map_err(|source| BoothError::Io {
                path: backup.clone(),
                source,
            })?;
            info!(photo = n, path = %backup.display(), "Backup photo: {}", backup.display());
        }

        Ok(())
    }

    fn processing<G: DigitalIo, C: Camera, K: Clock>(
        &self,
        rig: &mut Peripherals<G, C, K>,
    ) -> Result<(), BoothError> {
        info!("Processing...");
        let image = self.config.assets.processing();
        rig.overlays
            .show_for(&mut rig.clock, &image, SCREEN_LAYER, self.config.timing.processing())?;
        self.interrupt.check()
    }

    /// Shows each photo in turn. The previous photo is only removed once
    /// the next one is on screen, so there is never a blank frame between
    /// them.
    fn playback<G: DigitalIo, C: Camera, K: Clock>(
        &self,
        rig: &mut Peripherals<G, C, K>,
        session: &Session,
    ) -> Result<(), BoothError> {
        let mut previous: Option<OverlayHandle> = None;

        for (index, path) in session.captured_paths().iter().enumerate() {
            let layer = SCREEN_LAYER + 1 + index as i32;
            let current = rig.overlays.show(path, layer)?;
            rig.overlays.hide(&mut previous)?;
            previous = Some(current);

            rig.clock.sleep(self.config.timing.playback());
            self.interrupt.check()?;
        }

        rig.overlays.hide(&mut previous)?;
        Ok(())
    }

    fn finished<G: DigitalIo, C: Camera, K: Clock>(
        &self,
        rig: &mut Peripherals<G, C, K>,
    ) -> Result<(), BoothError> {
        info!("All done!");
        let image = self.config.assets.all_done();
        rig.overlays
            .show_for(&mut rig.clock, &image, SCREEN_LAYER, self.config.timing.done())?;
        self.interrupt.check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::hardware::{
        CameraError, CameraEvent, Direction, Level, MockCamera, MockGpio, Pull,
    };
    use crate::storage::StorageResolver;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    const LED: u8 = 4;

    struct Fixture {
        _root: TempDir,
        config: BoothConfig,
        storage: StorageTarget,
        interrupt: Interrupt,
    }

    fn fixture(photo_count: u32, with_media: bool, flashing: bool) -> Fixture {
        let root = TempDir::new().unwrap();
        let mut config = BoothConfig::default();
        config.capture.photo_count = photo_count;
        config.capture.photo_width = 40;
        config.capture.photo_height = 30;
        config.gpio.led_flashing = flashing;
        config.storage.media_root = root.path().join("media");
        config.storage.local_dir = root.path().join("local");
        config.assets.dir = root.path().join("assets");

        fs::create_dir_all(&config.assets.dir).unwrap();
        for asset in config.assets.required(photo_count) {
            image::RgbImage::from_pixel(20, 10, image::Rgb([1, 2, 3]))
                .save(asset)
                .unwrap();
        }
        if with_media {
            fs::create_dir_all(config.storage.media_root.join("usb")).unwrap();
        }

        let storage = StorageResolver::new(&config.storage).resolve(start());
        Fixture {
            _root: root,
            config,
            storage,
            interrupt: Interrupt::new(),
        }
    }

    fn start() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 9, 2)
            .unwrap()
            .and_hms_opt(18, 45, 0)
            .unwrap()
    }

    fn small_rig(
        config: &BoothConfig,
        camera: MockCamera,
    ) -> Peripherals<MockGpio, MockCamera, ManualClock> {
        let mut rig = Peripherals::new(MockGpio::new(), camera, ManualClock::starting_at(start()));
        rig.gpio
            .configure(LED, Direction::Output { initial: Level::Low }, Pull::Off)
            .unwrap();
        rig.overlays
            .camera_mut()
            .open(&config.capture.camera_settings())
            .unwrap();
        rig
    }

    #[test]
    fn test_session_captures_contiguous_files() {
        let fx = fixture(3, false, true);
        let mut rig = small_rig(&fx.config, MockCamera::new());

        let session = CaptureSequencer::new(&fx.config, &fx.storage, &fx.interrupt)
            .run_session(&mut rig)
            .unwrap();

        assert!(session.is_complete());
        let names: Vec<String> = session
            .captured_paths()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "2017-09-02_18-45-00_1of3.jpg",
                "2017-09-02_18-45-00_2of3.jpg",
                "2017-09-02_18-45-00_3of3.jpg",
            ]
        );
        for path in session.captured_paths() {
            assert!(path.starts_with(fx.storage.primary_path()));
            assert!(path.is_file());
        }
        assert_eq!(rig.overlays.live_count(), 0);
        assert_eq!(rig.overlays.camera().live_overlays(), 0);
    }

    #[test]
    fn test_countdown_cadence_and_led() {
        let fx = fixture(1, false, true);
        let mut rig = small_rig(&fx.config, MockCamera::new());

        CaptureSequencer::new(&fx.config, &fx.storage, &fx.interrupt)
            .run_session(&mut rig)
            .unwrap();

        // Configure-time Low, then 4 on/off pairs, then flash on/off
        let mut expected = vec![Level::Low];
        for _ in 0..4 {
            expected.extend([Level::High, Level::Low]);
        }
        expected.extend([Level::High, Level::Low]);
        assert_eq!(rig.gpio.writes_to(LED), expected);
        assert_eq!(rig.gpio.level(LED), Some(Level::Low));

        let annotations: Vec<String> = rig
            .overlays
            .camera()
            .events()
            .iter()
            .filter_map(|e| match e {
                CameraEvent::Annotation(text) => Some(text.trim().to_owned()),
                _ => None,
            })
            .collect();
        assert_eq!(annotations, vec!["...4", "...3", "...2", "...1", ""]);

        // prep 5 + countdown 4 + processing 3 + playback 3 + done 5
        assert_eq!(rig.clock.slept(), Duration::from_secs(20));
    }

    #[test]
    fn test_led_stays_dark_without_flashing() {
        let fx = fixture(2, false, false);
        let mut rig = small_rig(&fx.config, MockCamera::new());

        CaptureSequencer::new(&fx.config, &fx.storage, &fx.interrupt)
            .run_session(&mut rig)
            .unwrap();

        assert!(rig.gpio.writes_to(LED).iter().all(|l| *l == Level::Low));
    }

    #[test]
    fn test_playback_overlaps_by_one() {
        let fx = fixture(3, false, true);
        let mut rig = small_rig(&fx.config, MockCamera::new());

        let session = CaptureSequencer::new(&fx.config, &fx.storage, &fx.interrupt)
            .run_session(&mut rig)
            .unwrap();
        assert_eq!(session.captured_paths().len(), 3);

        // Playback overlays are the only ones whose layer exceeds the screen layer
        let events = rig.overlays.camera().events();
        let playback: Vec<(usize, crate::hardware::OverlayId, i32)> = events
            .iter()
            .enumerate()
            .filter_map(|(i, e)| match e {
                CameraEvent::OverlayLayer { id, layer } if *layer > SCREEN_LAYER => {
                    Some((i, *id, *layer))
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            playback.iter().map(|(_, _, l)| *l).collect::<Vec<_>>(),
            vec![4, 5, 6]
        );

        let removed_at = |id| {
            events
                .iter()
                .position(|e| *e == CameraEvent::OverlayRemoved(id))
                .unwrap()
        };
        // Photo n is removed only after photo n + 1 has been layered on screen
        for pair in playback.windows(2) {
            let (_, prev_id, _) = pair[0];
            let (next_layered_at, _, _) = pair[1];
            assert!(removed_at(prev_id) > next_layered_at);
        }
        let (_, last_id, _) = playback[2];
        let done_added = events
            .iter()
            .rposition(|e| matches!(e, CameraEvent::OverlayAdded { .. }))
            .unwrap();
        assert!(removed_at(last_id) < done_added);
    }

    #[test]
    fn test_backup_copies_are_identical() {
        let fx = fixture(2, true, true);
        assert!(fx.storage.is_external());
        let backup_dir = fx.storage.backup_path().unwrap().to_path_buf();
        let mut rig = small_rig(&fx.config, MockCamera::new());

        let session = CaptureSequencer::new(&fx.config, &fx.storage, &fx.interrupt)
            .run_session(&mut rig)
            .unwrap();

        for path in session.captured_paths() {
            let copy = backup_dir.join(path.file_name().unwrap());
            assert_eq!(fs::read(path).unwrap(), fs::read(copy).unwrap());
        }
    }

    #[test]
    fn test_capture_failure_propagates_with_led_off() {
        let fx = fixture(3, false, true);
        let mut rig = small_rig(&fx.config, MockCamera::new().fail_capture_at(2));

        let result = CaptureSequencer::new(&fx.config, &fx.storage, &fx.interrupt).run_session(&mut rig);

        assert!(matches!(
            result,
            Err(BoothError::Camera(CameraError::CaptureFailed { .. }))
        ));
        assert_eq!(rig.gpio.level(LED), Some(Level::Low));
        assert_eq!(rig.overlays.live_count(), 0);
        assert_eq!(rig.overlays.camera().captured().len(), 1);
    }

    #[test]
    fn test_interrupt_stops_sequence() {
        let fx = fixture(2, false, true);
        let mut rig = small_rig(&fx.config, MockCamera::new());
        fx.interrupt.trigger();

        let result = CaptureSequencer::new(&fx.config, &fx.storage, &fx.interrupt).run_session(&mut rig);

        assert!(matches!(result, Err(BoothError::Interrupted)));
        assert!(rig.overlays.camera().captured().is_empty());
        assert_eq!(rig.overlays.live_count(), 0);
    }
}
