//! Photo Booth Controller Library
//!
//! Drives an unattended, button-triggered photo booth: a GPIO arcade button
//! with an LED, a camera with a live preview and image overlays, and a
//! storage directory chosen once at startup.
//!
//! # Architecture
//!
//! A single control thread owns every peripheral:
//!
//! ```text
//! startup → idle (blink, poll button) → capture sequence → idle → …
//!              ↓                              ↓
//!           overlays                  storage (+ backup)
//! ```
//!
//! Any fault or operator interrupt unwinds to one boundary in
//! [`SessionController::run`], which releases overlays, the preview and
//! the GPIO pins exactly once.
//!
//! # Design Principles
//!
//! - **Capabilities, not drivers**: the booth only sees [`DigitalIo`],
//!   [`Camera`] and [`Clock`], so every sequence runs against mocks
//! - **Derived state**: the LED level follows the booth phase, it is never
//!   stored on its own
//! - **Owned overlays**: an overlay handle is the only way to remove it
//!
//! # Example
//!
//! ```no_run
//! use photo_booth::{
//!     BoothConfig, Interrupt, MockCamera, MockGpio, Peripherals, SessionController, SystemClock,
//! };
//!
//! let mut config = BoothConfig::default();
//! config.test.autopress_button = true;
//! config.test.no_startup_delay = true;
//!
//! let rig = Peripherals::new(MockGpio::new(), MockCamera::new(), SystemClock);
//! let mut controller = SessionController::new(config, rig, Interrupt::new());
//!
//! let outcome = controller.run();
//! println!("{:?}", outcome);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod clock;
pub mod config;
pub mod error;
pub mod hardware;
pub mod interrupt;
pub mod logging;
pub mod metrics;
pub mod overlay;
pub mod session;
pub mod storage;

// Re-export commonly used types at crate root
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{BoothConfig, ConfigError};
pub use error::{BoothError, StartupAbort};
pub use hardware::{Camera, DigitalIo, MockCamera, MockGpio};
pub use interrupt::Interrupt;
pub use overlay::{OverlayHandle, OverlayManager};
pub use session::{CaptureSequencer, Peripherals, RunOutcome, Session, SessionController};
pub use storage::{StorageResolver, StorageTarget};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
