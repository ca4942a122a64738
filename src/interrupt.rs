//! Operator interrupt flag.

use crate::error::BoothError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag raised by the Ctrl+C handler.
///
/// The control thread polls it between blocking steps; nothing is
/// cancelled mid-flight.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    /// A lowered flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag. Safe to call from a signal handler thread.
    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true once the flag has been raised.
    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Fails with [`BoothError::Interrupted`] once the flag is raised.
    pub fn check(&self) -> Result<(), BoothError> {
        if self.is_triggered() {
            Err(BoothError::Interrupted)
        } else {
            Ok(())
        }
    }
}
