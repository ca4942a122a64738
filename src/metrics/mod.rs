//! Prometheus metrics for booth activity.
//!
//! There is no HTTP endpoint. After each session the registry is written
//! in text exposition format to the configured `metrics_file`, for a node
//! exporter textfile collector to pick up.
//!
//! # Metrics Exposed
//!
//! - `photo_booth_sessions_total` - Completed guest sessions
//! - `photo_booth_photos_total` - Photos captured
//! - `photo_booth_backups_total` - Photos copied to the backup directory
//! - `photo_booth_storage_external` - 1 when saving to removable media
//! - `photo_booth_live_overlays` - Overlays on screen after the last session
//!
//! # Example
//!
//! ```no_run
//! use photo_booth::metrics::BoothMetrics;
//! use std::path::Path;
//!
//! let metrics = BoothMetrics::new().expect("Failed to create registry");
//! metrics.set_live_overlays(0);
//! metrics
//!     .write_textfile(Path::new("/var/lib/node_exporter/photo_booth.prom"))
//!     .expect("Failed to write metrics");
//! ```

mod collector;

pub use collector::{BoothMetrics, MetricsError};
