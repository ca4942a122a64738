//! Digital I/O abstraction for the arcade button and its LED.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use thiserror::Error;

/// Logic level of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Pulled to ground.
    Low,
    /// Driven or pulled high.
    High,
}

impl Level {
    /// Maps `true` to [`Level::High`].
    pub fn from_bool(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }

    /// Returns true for [`Level::High`].
    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

/// Pin direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Input pin.
    Input,
    /// Output pin driven to `initial` when configured.
    Output {
        /// Level written at configuration time.
        initial: Level,
    },
}

/// Internal pull resistor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    /// No pull resistor.
    Off,
    /// Pull-up: an open button reads high, a pressed one low.
    Up,
    /// Pull-down.
    Down,
}

/// Errors raised by the digital I/O driver.
#[derive(Debug, Error)]
pub enum GpioError {
    /// The pin was used before `configure`.
    #[error("pin {0} is not configured")]
    NotConfigured(u8),
    /// A write to an input pin.
    #[error("pin {0} is not configured as an output")]
    NotOutput(u8),
    /// Driver-level failure.
    #[error("gpio access failed: {0}")]
    Io(String),
}

/// Trait for digital I/O implementations.
///
/// `wait_for_falling_edge` blocks for at most `timeout`; its expiry is the
/// only scheduling tick the booth's idle loop has.
pub trait DigitalIo {
    /// Sets up a pin's direction and pull state.
    fn configure(&mut self, pin: u8, direction: Direction, pull: Pull) -> Result<(), GpioError>;

    /// Reads the current level of a pin.
    fn read(&mut self, pin: u8) -> Result<Level, GpioError>;

    /// Drives an output pin.
    fn write(&mut self, pin: u8, level: Level) -> Result<(), GpioError>;

    /// Waits up to `timeout` for a high-to-low transition.
    ///
    /// Returns `Ok(true)` when an edge was seen, `Ok(false)` on timeout.
    fn wait_for_falling_edge(&mut self, pin: u8, timeout: Duration) -> Result<bool, GpioError>;

    /// Releases every configured pin.
    fn release_all(&mut self);
}

#[derive(Debug, Clone, Copy)]
struct PinState {
    direction: Direction,
    level: Level,
}

/// In-process digital I/O used for simulation and tests.
///
/// Button presses are scripted: either queued per wait call or repeated
/// every N waits. Every output write and every release is recorded.
#[derive(Debug, Default)]
pub struct MockGpio {
    pins: HashMap<u8, PinState>,
    boot_levels: HashMap<u8, Level>,
    scripted_edges: VecDeque<bool>,
    press_every: Option<u64>,
    realtime: bool,
    waits: u64,
    writes: Vec<(u8, Level)>,
    releases: u32,
}

impl MockGpio {
    /// A mock with no scripted presses whose waits return immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock whose edge waits actually block for their timeout when no
    /// press is scripted, so the idle animation runs at real speed.
    pub fn realtime() -> Self {
        Self {
            realtime: true,
            ..Self::default()
        }
    }

    /// Level an input pin reports once configured, regardless of pull.
    pub fn with_boot_level(mut self, pin: u8, level: Level) -> Self {
        self.boot_levels.insert(pin, level);
        self
    }

    /// Reports a press on the `waits`-th edge wait from now.
    pub fn press_after(mut self, waits: usize) -> Self {
        let idle = waits.saturating_sub(1);
        self.scripted_edges.extend(std::iter::repeat(false).take(idle));
        self.scripted_edges.push_back(true);
        self
    }

    /// Reports a press on every `waits`-th edge wait once the scripted
    /// edges are exhausted.
    pub fn press_every(mut self, waits: u64) -> Self {
        self.press_every = Some(waits.max(1));
        self
    }

    /// Current level of a configured pin.
    pub fn level(&self, pin: u8) -> Option<Level> {
        self.pins.get(&pin).map(|p| p.level)
    }

    /// Every output write in order, including configuration-time levels.
    pub fn writes(&self) -> &[(u8, Level)] {
        &self.writes
    }

    /// Output writes to a single pin.
    pub fn writes_to(&self, pin: u8) -> Vec<Level> {
        self.writes
            .iter()
            .filter(|(p, _)| *p == pin)
            .map(|(_, level)| *level)
            .collect()
    }

    /// Number of `release_all` calls.
    pub fn release_count(&self) -> u32 {
        self.releases
    }

    /// Number of edge waits performed.
    pub fn wait_count(&self) -> u64 {
        self.waits
    }

    /// Returns true if the pin is currently configured.
    pub fn is_configured(&self, pin: u8) -> bool {
        self.pins.contains_key(&pin)
    }

    fn next_edge(&mut self) -> bool {
        if let Some(edge) = self.scripted_edges.pop_front() {
            return edge;
        }
        match self.press_every {
            Some(every) => self.waits % every == 0,
            None => false,
        }
    }
}

impl DigitalIo for MockGpio {
    fn configure(&mut self, pin: u8, direction: Direction, pull: Pull) -> Result<(), GpioError> {
        let level = match direction {
            Direction::Output { initial } => {
                self.writes.push((pin, initial));
                initial
            }
            Direction::Input => match self.boot_levels.get(&pin) {
                Some(level) => *level,
                None => Level::from_bool(pull == Pull::Up),
            },
        };
        self.pins.insert(pin, PinState { direction, level });
        tracing::debug!(pin, ?direction, ?pull, "MockGpio pin configured");
        Ok(())
    }

    fn read(&mut self, pin: u8) -> Result<Level, GpioError> {
        self.pins
            .get(&pin)
            .map(|p| p.level)
            .ok_or(GpioError::NotConfigured(pin))
    }

    fn write(&mut self, pin: u8, level: Level) -> Result<(), GpioError> {
        let state = self
            .pins
            .get_mut(&pin)
            .ok_or(GpioError::NotConfigured(pin))?;
        if state.direction == Direction::Input {
            return Err(GpioError::NotOutput(pin));
        }
        state.level = level;
        self.writes.push((pin, level));
        Ok(())
    }

    fn wait_for_falling_edge(&mut self, pin: u8, timeout: Duration) -> Result<bool, GpioError> {
        if !self.pins.contains_key(&pin) {
            return Err(GpioError::NotConfigured(pin));
        }
        self.waits += 1;
        let pressed = self.next_edge();
        if !pressed && self.realtime {
            std::thread::sleep(timeout);
        }
        Ok(pressed)
    }

    fn release_all(&mut self) {
        self.pins.clear();
        self.releases += 1;
        tracing::debug!("MockGpio released all pins");
    }
}
