//! Startup-time resolution of the primary and backup photo directories.

use crate::config::StorageConfig;
use chrono::NaiveDateTime;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where photos are written for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageTarget {
    primary: PathBuf,
    backup: Option<PathBuf>,
    external: bool,
}

impl StorageTarget {
    /// Directory every capture is written to.
    #[inline]
    pub fn primary_path(&self) -> &Path {
        &self.primary
    }

    /// Directory every capture is copied to, when backups are active.
    #[inline]
    pub fn backup_path(&self) -> Option<&Path> {
        self.backup.as_deref()
    }

    /// Returns true when the primary directory is on removable media.
    #[inline]
    pub fn is_external(&self) -> bool {
        self.external
    }
}

/// Picks the photo directories once at startup.
///
/// Resolution never fails: every candidate error is logged and skipped,
/// and the local directory is the final answer.
pub struct StorageResolver<'a> {
    config: &'a StorageConfig,
}

impl<'a> StorageResolver<'a> {
    /// Resolver over the configured media root and local directory.
    pub fn new(config: &'a StorageConfig) -> Self {
        Self { config }
    }

    /// Resolves the storage target, stamping markers with `now`.
    pub fn resolve(&self, now: NaiveDateTime) -> StorageTarget {
        let stamp = now.format("%Y-%m-%d %H:%M:%S").to_string();

        let (primary, external) = match self.first_writable_mount(&stamp) {
            Some(path) => (path, true),
            None => (self.local_default(), false),
        };
        info!(path = %primary.display(), "Saving to {}", primary.display());

        let local = &self.config.local_dir;
        let backup = if self.config.backup_enabled && primary != *local {
            if let Err(e) = fs::create_dir_all(local) {
                warn!(path = %local.display(), error = %e, "Failed to create backup directory");
            }
            info!(path = %local.display(), "Saving backup files to {}", local.display());
            Some(local.clone())
        } else {
            info!("Not saving backup files");
            None
        };

        StorageTarget {
            primary,
            backup,
            external,
        }
    }

    /// Mount points under the media root, in name order.
    fn candidates(&self) -> Vec<PathBuf> {
        let root = &self.config.media_root;
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(root = %root.display(), error = %e, "No removable media root");
                return Vec::new();
            }
        };

        let mut mounts: Vec<PathBuf> = entries.flatten().map(|entry| entry.path()).collect();
        mounts.sort();
        mounts
    }

    fn first_writable_mount(&self, stamp: &str) -> Option<PathBuf> {
        self.candidates()
            .into_iter()
            .find_map(|mount| match self.prepare_candidate(&mount, stamp) {
                Ok(target) => Some(target),
                Err(e) => {
                    warn!(mount = %mount.display(), error = %e, "Skipping removable media candidate");
                    None
                }
            })
    }

    /// Creates the photo directory on a mount if needed and proves it is
    /// writable by appending a timestamp line to the marker file.
    fn prepare_candidate(&self, mount: &Path, stamp: &str) -> io::Result<PathBuf> {
        let target = mount.join(&self.config.photo_subdir);
        debug!(candidate = %target.display(), "Checking removable media");

        if !target.exists() {
            fs::create_dir_all(&target)?;
        }

        let mut marker = OpenOptions::new()
            .create(true)
            .append(true)
            .open(target.join(&self.config.marker_file))?;
        marker.write_all(format!("{stamp}\r\n").as_bytes())?;
        marker.sync_all()?;

        Ok(target)
    }

    fn local_default(&self) -> PathBuf {
        let local = &self.config.local_dir;
        if let Err(e) = fs::create_dir_all(local) {
            warn!(path = %local.display(), error = %e, "Failed to create local photo directory");
        }
        local.clone()
    }
}
