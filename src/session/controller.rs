//! Top-level booth loop.
//!
//! ```text
//! Startup → Idle (blinking) → Capturing → Idle → … → Shutdown
//! ```
//!
//! [`SessionController::run`] is the single outer boundary: every error
//! from startup, the idle loop or a capture sequence ends up there, gets
//! logged, and is followed by exactly one shutdown.

use super::led::{BlinkTimer, Led, LedPhase};
use super::{CaptureSequencer, Peripherals, Session};
use crate::clock::Clock;
use crate::config::BoothConfig;
use crate::error::{BoothError, StartupAbort};
use crate::hardware::{Camera, DigitalIo, Direction, Level, Pull};
use crate::interrupt::Interrupt;
use crate::metrics::BoothMetrics;
use crate::overlay::{OverlayHandle, OPAQUE, PROMPT_LAYER, SCREEN_LAYER, TRANSPARENT};
use crate::storage::{StorageResolver, StorageTarget};
use std::time::Duration;
use tracing::{error, info, warn};

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Stopped before the main loop.
    Aborted(StartupAbort),
    /// Single-cycle test mode finished.
    Completed {
        /// Sessions completed.
        sessions: u64,
    },
    /// Operator pressed Ctrl+C.
    Interrupted {
        /// Sessions completed before the interrupt.
        sessions: u64,
    },
    /// An unrecovered fault stopped the booth.
    Failed {
        /// Sessions completed before the fault.
        sessions: u64,
        /// The logged error.
        message: String,
    },
}

impl RunOutcome {
    /// Returns true if the booth never reached its main loop.
    pub fn is_aborted(&self) -> bool {
        matches!(self, RunOutcome::Aborted(_))
    }
}

/// Drives the booth from power-on to shutdown.
pub struct SessionController<G: DigitalIo, C: Camera, K: Clock> {
    config: BoothConfig,
    rig: Peripherals<G, C, K>,
    interrupt: Interrupt,
    led: Led,
    metrics: Option<BoothMetrics>,
    camera_acquired: bool,
    sessions: u64,
    shut_down: bool,
}

impl<G: DigitalIo, C: Camera, K: Clock> SessionController<G, C, K> {
    /// Creates a controller. `config` should already be the effective,
    /// validated configuration.
    pub fn new(config: BoothConfig, rig: Peripherals<G, C, K>, interrupt: Interrupt) -> Self {
        let led = Led::new(config.gpio.led_pin, config.gpio.led_flashing);
        let metrics = match BoothMetrics::new() {
            Ok(metrics) => Some(metrics),
            Err(e) => {
                warn!(error = %e, "Metrics disabled");
                None
            }
        };

        Self {
            config,
            rig,
            interrupt,
            led,
            metrics,
            camera_acquired: false,
            sessions: 0,
            shut_down: false,
        }
    }

    /// The devices this controller drives.
    pub fn peripherals(&self) -> &Peripherals<G, C, K> {
        &self.rig
    }

    /// Metrics collected so far.
    pub fn metrics(&self) -> Option<&BoothMetrics> {
        self.metrics.as_ref()
    }

    /// Completed sessions.
    pub fn sessions(&self) -> u64 {
        self.sessions
    }

    /// Runs the booth until it stops, then shuts down.
    pub fn run(&mut self) -> RunOutcome {
        info!("Photo booth initializing");

        let outcome = match self.run_until_stopped() {
            Ok(()) => RunOutcome::Completed {
                sessions: self.sessions,
            },
            Err(BoothError::StartupAborted(abort)) => {
                error!("exiting - {}", abort);
                RunOutcome::Aborted(abort)
            }
            Err(BoothError::Interrupted) => {
                info!("keyboard interrupt");
                RunOutcome::Interrupted {
                    sessions: self.sessions,
                }
            }
            Err(e) => {
                error!("unexpected error: {}", e);
                RunOutcome::Failed {
                    sessions: self.sessions,
                    message: e.to_string(),
                }
            }
        };

        self.shutdown();
        outcome
    }

    /// Releases every peripheral. Runs at most once; later calls, including
    /// the one from `Drop`, do nothing.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        let leftover = self.rig.overlays.hide_all();
        if leftover > 0 {
            info!(leftover, "Removed overlays left on screen");
        }
        if self.camera_acquired {
            self.rig.overlays.camera_mut().stop_preview();
        }
        self.rig.gpio.release_all();
        info!("logfile closed");
    }

    fn run_until_stopped(&mut self) -> Result<(), BoothError> {
        let storage = self.startup()?;

        self.rig
            .overlays
            .camera_mut()
            .start_preview(self.config.capture.screen_resolution())?;

        loop {
            self.wait_for_press()?;
            self.capture(&storage)?;

            if self.config.test.autopress_button {
                info!("Single-cycle test run finished");
                return Ok(());
            }
        }
    }

    fn startup(&mut self) -> Result<StorageTarget, BoothError> {
        let gpio = &self.config.gpio;
        self.rig.gpio.configure(gpio.button_pin, Direction::Input, Pull::Up)?;
        self.rig.gpio.configure(
            gpio.led_pin,
            Direction::Output {
                initial: Level::Low,
            },
            Pull::Off,
        )?;

        if self.rig.gpio.read(gpio.button_pin)? == Level::Low {
            return Err(BoothError::StartupAborted(StartupAbort::ButtonHeld));
        }

        let settings = self.config.capture.camera_settings();
        if let Err(e) = self.rig.overlays.camera_mut().open(&settings) {
            error!("error initializing the camera - exiting");
            return Err(BoothError::StartupAborted(StartupAbort::CameraUnavailable(
                e.to_string(),
            )));
        }
        self.camera_acquired = true;
        self.rig
            .overlays
            .camera_mut()
            .set_resolution(settings.resolution)?;

        if !self.config.test.no_startup_delay {
            self.startup_delay()?;
        }

        let storage = StorageResolver::new(&self.config.storage).resolve(self.rig.clock.now());
        if let Some(metrics) = &self.metrics {
            metrics.set_storage(&storage);
        }
        Ok(storage)
    }

    /// Shows the startup screens for the configured delay, blinking the
    /// second one once per second on the idle tick.
    fn startup_delay(&mut self) -> Result<(), BoothError> {
        let timing = &self.config.timing;
        info!("Startup delay {} seconds", timing.startup_delay_secs);

        let assets = &self.config.assets;
        let mut background = Some(
            self.rig
                .overlays
                .show(&assets.startup_background(), SCREEN_LAYER)?,
        );
        let mut prompt = Some(self.rig.overlays.show(&assets.startup_prompt(), PROMPT_LAYER)?);

        let total = Duration::from_secs(timing.startup_delay_secs);
        let poll = timing.poll_interval();
        let mut elapsed = Duration::ZERO;
        let mut second = 0;
        while elapsed < total {
            // The last tick is cut short so the delay ends on time
            let step = poll.min(total - elapsed);
            self.rig.clock.sleep(step);
            elapsed += step;
            self.interrupt.check()?;

            if elapsed.as_secs() != second {
                second = elapsed.as_secs();
                if let Some(handle) = prompt.as_mut() {
                    let alpha = if second % 2 == 1 { OPAQUE } else { TRANSPARENT };
                    self.rig.overlays.set_alpha(handle, alpha)?;
                }
            }
        }

        self.rig.overlays.hide(&mut background)?;
        self.rig.overlays.hide(&mut prompt)?;
        Ok(())
    }

    /// Idle: intro screens up, prompt and LED blinking together, until the
    /// button is pressed.
    fn wait_for_press(&mut self) -> Result<(), BoothError> {
        info!("");
        info!("Welcome to the photo booth!");
        info!("Press the button to take a photo");

        self.led.show(&mut self.rig.gpio, LedPhase::Idle { lit: true })?;

        let assets = &self.config.assets;
        let mut background: Option<OverlayHandle> =
            Some(self.rig.overlays.show(&assets.intro_background(), SCREEN_LAYER)?);
        let mut prompt: Option<OverlayHandle> =
            Some(self.rig.overlays.show(&assets.intro_prompt(), PROMPT_LAYER)?);

        let button = self.config.gpio.button_pin;
        let poll = self.config.timing.poll_interval();
        let mut blink = BlinkTimer::new(self.config.timing.blink_speed);

        loop {
            self.interrupt.check()?;

            let edge = self.rig.gpio.wait_for_falling_edge(button, poll)?;
            if edge || self.config.test.autopress_button {
                break;
            }

            if let Some(lit) = blink.tick() {
                if let Some(handle) = prompt.as_mut() {
                    let alpha = if lit { OPAQUE } else { TRANSPARENT };
                    self.rig.overlays.set_alpha(handle, alpha)?;
                }
                self.led.show(&mut self.rig.gpio, LedPhase::Idle { lit })?;
            }
        }

        info!("Button pressed");
        self.rig.overlays.hide(&mut prompt)?;
        self.rig.overlays.hide(&mut background)?;
        self.led.show(&mut self.rig.gpio, LedPhase::Off)?;
        Ok(())
    }

    /// Capturing: the button is not polled until the sequence returns.
    fn capture(&mut self, storage: &StorageTarget) -> Result<(), BoothError> {
        let session: Session =
            CaptureSequencer::new(&self.config, storage, &self.interrupt).run_session(&mut self.rig)?;
        self.sessions += 1;

        info!(
            sessions = self.sessions,
            photos = session.captured_paths().len(),
            "Session complete"
        );

        if let Some(metrics) = &self.metrics {
            metrics.record_session(&session, storage.backup_path().is_some());
            metrics.set_live_overlays(self.rig.overlays.live_count());
            if let Some(path) = &self.config.metrics_file {
                if let Err(e) = metrics.write_textfile(path) {
                    warn!(path = %path.display(), error = %e, "Failed to write metrics");
                }
            }
        }

        Ok(())
    }
}

impl<G: DigitalIo, C: Camera, K: Clock> Drop for SessionController<G, C, K> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
