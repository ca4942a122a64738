//! Metrics collection and registry.

use crate::session::Session;
use crate::storage::StorageTarget;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registering or encoding a metric failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
    /// The textfile could not be written or moved into place.
    #[error("failed to write metrics to {}: {source}", path.display())]
    Write {
        /// Destination textfile.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Prometheus metrics registry for the booth.
pub struct BoothMetrics {
    registry: Registry,

    // Activity
    sessions_total: IntCounter,
    photos_total: IntCounter,
    backups_total: IntCounter,

    // State
    storage_external: IntGauge,
    live_overlays: IntGauge,
}

impl BoothMetrics {
    /// Creates a registry with every booth metric registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let sessions_total = IntCounter::new(
            "photo_booth_sessions_total",
            "Total number of completed guest sessions",
        )?;
        let photos_total = IntCounter::new(
            "photo_booth_photos_total",
            "Total number of photos captured",
        )?;
        let backups_total = IntCounter::new(
            "photo_booth_backups_total",
            "Total number of photos copied to the backup directory",
        )?;
        let storage_external = IntGauge::new(
            "photo_booth_storage_external",
            "Whether photos are saved to removable media (1=yes, 0=no)",
        )?;
        let live_overlays = IntGauge::new(
            "photo_booth_live_overlays",
            "Overlays on screen when the last session finished",
        )?;

        registry.register(Box::new(sessions_total.clone()))?;
        registry.register(Box::new(photos_total.clone()))?;
        registry.register(Box::new(backups_total.clone()))?;
        registry.register(Box::new(storage_external.clone()))?;
        registry.register(Box::new(live_overlays.clone()))?;

        Ok(Self {
            registry,
            sessions_total,
            photos_total,
            backups_total,
            storage_external,
            live_overlays,
        })
    }

    /// Records where photos are going for this run.
    pub fn set_storage(&self, target: &StorageTarget) {
        self.storage_external
            .set(if target.is_external() { 1 } else { 0 });
    }

    /// Counts a finished session and its photos.
    pub fn record_session(&self, session: &Session, backed_up: bool) {
        let photos = session.captured_paths().len() as u64;
        self.sessions_total.inc();
        self.photos_total.inc_by(photos);
        if backed_up {
            self.backups_total.inc_by(photos);
        }
    }

    /// Records how many overlays are still on screen.
    pub fn set_live_overlays(&self, count: usize) {
        self.live_overlays.set(count as i64);
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Writes the encoded metrics to `path` for a node exporter textfile
    /// collector. The file is replaced in one rename so scrapes never see
    /// a partial write.
    pub fn write_textfile(&self, path: &Path) -> Result<(), MetricsError> {
        let body = self.encode()?;
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let io_err = |source| MetricsError::Write {
            path: path.to_path_buf(),
            source,
        };
        fs::write(&tmp, body).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn session_with(photos: u32) -> Session {
        let at = NaiveDate::from_ymd_opt(2017, 9, 2)
            .unwrap()
            .and_hms_opt(20, 15, 0)
            .unwrap();
        let mut session = Session::begin(at, photos);
        for n in 1..=photos {
            session.record(Path::new(&session.photo_file_name(n)));
        }
        session
    }

    #[test]
    fn test_registry_creation() {
        let registry = BoothMetrics::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_record_session() {
        let metrics = BoothMetrics::new().unwrap();

        metrics.record_session(&session_with(3), true);
        metrics.record_session(&session_with(3), false);

        let output = metrics.encode().unwrap();
        assert!(output.contains("photo_booth_sessions_total 2"));
        assert!(output.contains("photo_booth_photos_total 6"));
        assert!(output.contains("photo_booth_backups_total 3"));
    }

    #[test]
    fn test_metrics_encode() {
        let metrics = BoothMetrics::new().unwrap();
        metrics.set_live_overlays(2);
        let output = metrics.encode().unwrap();

        assert!(output.contains("photo_booth_storage_external 0"));
        assert!(output.contains("photo_booth_live_overlays 2"));
    }

    #[test]
    fn test_write_textfile_replaces_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("booth.prom");
        let metrics = BoothMetrics::new().unwrap();

        metrics.write_textfile(&path).unwrap();
        metrics.record_session(&session_with(1), false);
        metrics.write_textfile(&path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("photo_booth_sessions_total 1"));
        assert!(!dir.path().join("booth.prom.tmp").exists());
    }

    #[test]
    fn test_write_textfile_missing_dir() {
        let dir = TempDir::new().unwrap();
        let metrics = BoothMetrics::new().unwrap();

        let result = metrics.write_textfile(&dir.path().join("missing").join("booth.prom"));
        assert!(matches!(result, Err(MetricsError::Write { .. })));
    }
}
