//! Photo storage selection.
//!
//! Removable media is preferred so an operator can swap storage without
//! touching the device. When no removable medium is usable the booth falls
//! back to a local directory and keeps working.

mod resolver;

pub use resolver::{StorageResolver, StorageTarget};
