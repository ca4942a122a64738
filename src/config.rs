//! Booth configuration.
//!
//! The configuration is loaded once at startup, adjusted for the test-mode
//! flags by [`BoothConfig::effective`], validated, and then only borrowed.
//! Nothing mutates it afterwards.

use crate::hardware::{CameraSettings, Resolution};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Full configuration file format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BoothConfig {
    /// Append-only log file; `None` logs to stderr only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    /// Prometheus textfile written after every session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_file: Option<PathBuf>,
    /// Button and LED pins.
    #[serde(default)]
    pub gpio: GpioConfig,
    /// Screen and countdown durations.
    #[serde(default)]
    pub timing: TimingConfig,
    /// Photo and display settings.
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Photo directories.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Overlay images.
    #[serde(default)]
    pub assets: AssetsConfig,
    /// Bench-testing shortcuts.
    #[serde(default)]
    pub test: TestModeConfig,
}

/// Pin assignment for the arcade button and its LED.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpioConfig {
    /// Button input (pulled up, pressed = low).
    pub button_pin: u8,
    /// LED output.
    pub led_pin: u8,
    /// Blink the LED with the on-screen prompts. When off, the LED stays lit
    /// while idle and dark for the whole capture sequence.
    pub led_flashing: bool,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            button_pin: 17,
            led_pin: 4,
            led_flashing: true,
        }
    }
}

/// Durations of every timed screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Startup screens shown before the first guest.
    pub startup_delay_secs: u64,
    /// "Get ready" screen before each photo.
    pub prep_delay_secs: u64,
    /// Countdown length; each second is one LED on/off cycle.
    pub countdown_secs: u32,
    /// How long each photo is shown during playback.
    pub playback_secs: u64,
    /// "Processing" screen after the last photo.
    pub processing_secs: u64,
    /// "All done" screen at the end of a session.
    pub done_secs: u64,
    /// Idle ticks per half blink cycle.
    pub blink_speed: u32,
    /// Edge-wait timeout; the idle loop's tick.
    pub poll_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            startup_delay_secs: 60,
            prep_delay_secs: 5,
            countdown_secs: 4,
            playback_secs: 3,
            processing_secs: 3,
            done_secs: 5,
            blink_speed: 8,
            poll_interval_ms: 100,
        }
    }
}

impl TimingConfig {
    /// [`Self::prep_delay_secs`] as a duration.
    pub fn prep_delay(&self) -> Duration {
        Duration::from_secs(self.prep_delay_secs)
    }

    /// [`Self::playback_secs`] as a duration.
    pub fn playback(&self) -> Duration {
        Duration::from_secs(self.playback_secs)
    }

    /// [`Self::processing_secs`] as a duration.
    pub fn processing(&self) -> Duration {
        Duration::from_secs(self.processing_secs)
    }

    /// [`Self::done_secs`] as a duration.
    pub fn done(&self) -> Duration {
        Duration::from_secs(self.done_secs)
    }

    /// [`Self::poll_interval_ms`] as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Photo and display settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Photos taken per guest.
    pub photo_count: u32,
    /// Still capture width.
    pub photo_width: u32,
    /// Still capture height.
    pub photo_height: u32,
    /// Preview width.
    pub screen_width: u32,
    /// Preview height.
    pub screen_height: u32,
    /// Countdown text size.
    pub annotation_size: u8,
    /// Sensor rotation in degrees.
    pub rotation: u16,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            photo_count: 3,
            photo_width: 1920,
            photo_height: 1152,
            screen_width: 800,
            screen_height: 480,
            annotation_size: 80,
            rotation: 0,
        }
    }
}

impl CaptureConfig {
    /// Still capture resolution.
    pub fn photo_resolution(&self) -> Resolution {
        Resolution::new(self.photo_width, self.photo_height)
    }

    /// Preview resolution.
    pub fn screen_resolution(&self) -> Resolution {
        Resolution::new(self.screen_width, self.screen_height)
    }

    /// Settings handed to the camera when it is opened.
    pub fn camera_settings(&self) -> CameraSettings {
        CameraSettings {
            resolution: self.photo_resolution(),
            rotation: self.rotation,
            annotation_size: self.annotation_size,
        }
    }
}

/// Where photos go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory whose entries are removable-media mount points.
    pub media_root: PathBuf,
    /// Local fallback directory, also the backup target.
    pub local_dir: PathBuf,
    /// Directory created on a removable medium to hold photos.
    pub photo_subdir: String,
    /// File appended on a removable medium to prove it is writable.
    pub marker_file: String,
    /// Copy every photo to `local_dir` when the primary is removable media.
    pub backup_enabled: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            media_root: PathBuf::from("/media/pi"),
            local_dir: PathBuf::from("/home/pi/photo-booth/photos"),
            photo_subdir: "booth-photos".into(),
            marker_file: "__booth_init.txt".into(),
            backup_enabled: true,
        }
    }
}

/// Screen images shown by the booth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory holding every screen image.
    pub dir: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("/home/pi/photo-booth/assets"),
        }
    }
}

impl AssetsConfig {
    /// Idle screen background.
    pub fn intro_background(&self) -> PathBuf {
        self.dir.join("intro_1.png")
    }

    /// Blinking "press the button" prompt.
    pub fn intro_prompt(&self) -> PathBuf {
        self.dir.join("intro_2.png")
    }

    /// Startup delay background.
    pub fn startup_background(&self) -> PathBuf {
        self.dir.join("startup_1.png")
    }

    /// Blinking startup prompt.
    pub fn startup_prompt(&self) -> PathBuf {
        self.dir.join("startup_2.png")
    }

    /// "Get ready" screen for photo `n` (1-based).
    pub fn get_ready(&self, n: u32) -> PathBuf {
        self.dir.join(format!("get_ready_{n}.png"))
    }

    /// Shown after the last photo.
    pub fn processing(&self) -> PathBuf {
        self.dir.join("processing.png")
    }

    /// Shown at the end of a session.
    pub fn all_done(&self) -> PathBuf {
        self.dir.join("all_done.png")
    }

    /// Every asset a run with `photo_count` photos will load.
    pub fn required(&self, photo_count: u32) -> Vec<PathBuf> {
        let mut paths = vec![
            self.intro_background(),
            self.intro_prompt(),
            self.startup_background(),
            self.startup_prompt(),
            self.processing(),
            self.all_done(),
        ];
        paths.extend((1..=photo_count).map(|n| self.get_ready(n)));
        paths
    }
}

/// Shortcuts for bench testing. All must be off on a real booth.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestModeConfig {
    /// Press the button automatically and exit after one session.
    pub autopress_button: bool,
    /// Two photos, short prep and a 10 second startup delay.
    pub fast: bool,
    /// Skip the startup delay entirely.
    pub no_startup_delay: bool,
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// `photo_count` is zero.
    #[error("photo count must be at least 1")]
    NoPhotos,
    /// A photo or screen dimension is zero.
    #[error("invalid {0} resolution")]
    InvalidResolution(&'static str),
    /// `blink_speed` is zero.
    #[error("blink speed must be at least one tick")]
    InvalidBlinkSpeed,
    /// `poll_interval_ms` is zero.
    #[error("poll interval must be non-zero")]
    InvalidPollInterval,
    /// Button and LED are on the same pin.
    #[error("button and LED cannot share pin {0}")]
    PinConflict(u8),
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The file is not valid TOML for this format.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
    /// The config could not be written as TOML.
    #[error("failed to serialize config: {0}")]
    SerializeError(String),
}

impl BoothConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Returns the configuration with test-mode timing applied.
    pub fn effective(&self) -> Self {
        let mut config = self.clone();
        if config.test.fast {
            config.capture.photo_count = 2;
            config.timing.prep_delay_secs = 2;
            config.timing.startup_delay_secs = 10;
        }
        config
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capture.photo_count == 0 {
            return Err(ConfigError::NoPhotos);
        }
        if self.capture.photo_width == 0 || self.capture.photo_height == 0 {
            return Err(ConfigError::InvalidResolution("photo"));
        }
        if self.capture.screen_width == 0 || self.capture.screen_height == 0 {
            return Err(ConfigError::InvalidResolution("screen"));
        }
        if self.timing.blink_speed == 0 {
            return Err(ConfigError::InvalidBlinkSpeed);
        }
        if self.timing.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidPollInterval);
        }
        if self.gpio.button_pin == self.gpio.led_pin {
            return Err(ConfigError::PinConflict(self.gpio.button_pin));
        }
        Ok(())
    }

    /// Serializes the configuration back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }
}
