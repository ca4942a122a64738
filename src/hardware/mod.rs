//! Peripheral capabilities the booth drives.
//!
//! The booth never talks to hardware directly. It drives a digital I/O
//! capability (button input and LED output) and a camera capability
//! (preview, stills, annotation text and image overlays). Both are traits
//! so the controller can run against real drivers or the in-process mocks
//! provided here.

mod camera;
mod gpio;

pub use camera::{
    Camera, CameraError, CameraEvent, CameraSettings, MockCamera, OverlayId, OverlayImage,
    Resolution,
};
pub use gpio::{DigitalIo, Direction, GpioError, Level, MockGpio, Pull};
