//! Arcade button LED.
//!
//! The LED level is never stored. It is derived from the phase the booth is
//! in, so every write goes through [`LedPhase::level`].

use crate::hardware::{DigitalIo, GpioError, Level};

/// What the booth is doing, as far as the LED is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedPhase {
    /// Waiting for a guest.
    Idle {
        /// Follows the blinking prompt.
        lit: bool,
    },
    /// Counting down to a photo.
    Countdown {
        /// Alternates every half second.
        lit: bool,
    },
    /// The shutter is firing.
    CaptureFlash,
    /// Everything else.
    Off,
}

impl LedPhase {
    /// Level the LED must show in this phase.
    ///
    /// With flashing disabled the LED is steadily lit while idle and dark
    /// otherwise.
    pub fn level(self, flashing: bool) -> Level {
        let lit = match self {
            LedPhase::Idle { lit } => lit || !flashing,
            LedPhase::Countdown { lit } => lit && flashing,
            LedPhase::CaptureFlash => flashing,
            LedPhase::Off => false,
        };
        Level::from_bool(lit)
    }
}

/// The LED output pin.
#[derive(Debug, Clone, Copy)]
pub struct Led {
    pin: u8,
    flashing: bool,
}

impl Led {
    /// LED on `pin`; `flashing` mirrors the `led_flashing` setting.
    pub fn new(pin: u8, flashing: bool) -> Self {
        Self { pin, flashing }
    }

    /// Drives the LED to match `phase`.
    pub fn show<G: DigitalIo>(&self, gpio: &mut G, phase: LedPhase) -> Result<(), GpioError> {
        gpio.write(self.pin, phase.level(self.flashing))
    }
}

/// Tick counter for the idle blink.
///
/// After `speed` ticks the prompt turns on, after `2 * speed` it turns off
/// and the cycle restarts.
#[derive(Debug, Clone)]
pub struct BlinkTimer {
    speed: u32,
    ticks: u32,
}

impl BlinkTimer {
    /// Timer with `speed` ticks per half cycle, at least one.
    pub fn new(speed: u32) -> Self {
        Self {
            speed: speed.max(1),
            ticks: 0,
        }
    }

    /// Advances one tick. Returns the new lit state when it changes.
    pub fn tick(&mut self) -> Option<bool> {
        self.ticks += 1;
        if self.ticks == self.speed {
            Some(true)
        } else if self.ticks >= 2 * self.speed {
            self.ticks = 0;
            Some(false)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::{Direction, MockGpio, Pull};

    #[test]
    fn test_countdown_never_lit_without_flashing() {
        for lit in [true, false] {
            assert_eq!(LedPhase::Countdown { lit }.level(false), Level::Low);
        }
        assert_eq!(LedPhase::CaptureFlash.level(false), Level::Low);
    }

    #[test]
    fn test_idle_steady_without_flashing() {
        assert_eq!(LedPhase::Idle { lit: false }.level(false), Level::High);
        assert_eq!(LedPhase::Idle { lit: false }.level(true), Level::Low);
        assert_eq!(LedPhase::Idle { lit: true }.level(true), Level::High);
    }

    #[test]
    fn test_off_is_always_low() {
        assert_eq!(LedPhase::Off.level(true), Level::Low);
        assert_eq!(LedPhase::Off.level(false), Level::Low);
    }

    #[test]
    fn test_led_writes_phase_level() {
        let mut gpio = MockGpio::new();
        gpio.configure(4, Direction::Output { initial: Level::Low }, Pull::Off)
            .unwrap();
        let led = Led::new(4, true);

        led.show(&mut gpio, LedPhase::CaptureFlash).unwrap();
        assert_eq!(gpio.level(4), Some(Level::High));
        led.show(&mut gpio, LedPhase::Off).unwrap();
        assert_eq!(gpio.level(4), Some(Level::Low));
    }

    #[test]
    fn test_blink_timer_cycle() {
        let mut timer = BlinkTimer::new(3);
        let changes: Vec<Option<bool>> = (0..12).map(|_| timer.tick()).collect();
        assert_eq!(
            changes,
            vec![
                None,
                None,
                Some(true),
                None,
                None,
                Some(false),
                None,
                None,
                Some(true),
                None,
                None,
                Some(false),
            ]
        );
    }
}
