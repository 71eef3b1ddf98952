//! Scoped ownership of temporary files and directories.
//!
//! Every temporary artifact created while serving a request is registered
//! with that request's [`ResourceGuard`]. `release()` deletes them newest
//! first and runs once; `Drop` calls it too, so early returns, errors and
//! unwinding all clean up.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use triage_core::ScanError;

const TEMP_PREFIX: &str = "triage-";
const MAX_SUFFIX_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseKind {
    File,
    Directory,
}

/// Ownership record for one temporary artifact.
#[derive(Debug)]
pub struct ResourceLease {
    path: PathBuf,
    kind: LeaseKind,
    released: AtomicBool,
}

impl ResourceLease {
    fn new(path: PathBuf, kind: LeaseKind) -> Self {
        Self {
            path,
            kind,
            released: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> LeaseKind {
        self.kind
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Delete the artifact. Returns `true` only for the call that did the work.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::AcqRel) {
            return false;
        }

        let result = match self.kind {
            LeaseKind::File => fs::remove_file(&self.path),
            LeaseKind::Directory => fs::remove_dir_all(&self.path),
        };

        match result {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to delete temporary resource"
                );
            }
        }
        true
    }
}

/// Per-request owner of temporary state.
#[derive(Debug)]
pub struct ResourceGuard {
    base_dir: PathBuf,
    leases: Mutex<Vec<Arc<ResourceLease>>>,
    released: AtomicBool,
}

impl Default for ResourceGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceGuard {
    /// Guard rooted in the system temp directory.
    pub fn new() -> Self {
        Self::in_dir(std::env::temp_dir())
    }

    pub fn in_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            leases: Mutex::new(Vec::new()),
            released: AtomicBool::new(false),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<ResourceLease>>> {
        // A panic while holding the lock leaves the list intact.
        self.leases
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create a temp file and return an open write handle plus its lease.
    ///
    /// `suffix` is reduced to a short alphanumeric extension so that member
    /// names can never influence where the file lands.
    pub fn create_file(&self, suffix: &str) -> Result<(File, Arc<ResourceLease>), ScanError> {
        let mut leases = self.lock();
        if self.is_released() {
            return Err(ScanError::Internal(
                "resource guard already released".to_string(),
            ));
        }

        let named = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(&safe_suffix(suffix))
            .tempfile_in(&self.base_dir)
            .map_err(|e| ScanError::Internal(format!("Failed to create temp file: {}", e)))?;
        let (file, path) = named
            .keep()
            .map_err(|e| ScanError::Internal(format!("Failed to keep temp file: {}", e)))?;

        let lease = Arc::new(ResourceLease::new(path, LeaseKind::File));
        leases.push(Arc::clone(&lease));
        tracing::trace!(path = %lease.path().display(), "Temp file registered");
        Ok((file, lease))
    }

    /// Create a temp directory. Everything inside it is removed on release.
    pub fn create_dir(&self) -> Result<Arc<ResourceLease>, ScanError> {
        let mut leases = self.lock();
        if self.is_released() {
            return Err(ScanError::Internal(
                "resource guard already released".to_string(),
            ));
        }

        let dir = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempdir_in(&self.base_dir)
            .map_err(|e| ScanError::Internal(format!("Failed to create temp directory: {}", e)))?;
        #[allow(deprecated)]
        let path = dir.into_path();

        let lease = Arc::new(ResourceLease::new(path, LeaseKind::Directory));
        leases.push(Arc::clone(&lease));
        tracing::trace!(path = %lease.path().display(), "Temp directory registered");
        Ok(lease)
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Number of artifacts currently tracked.
    pub fn tracked(&self) -> usize {
        self.lock().len()
    }

    /// Delete every tracked artifact, most recent first.
    ///
    /// Safe to call any number of times; only the first call does work.
    /// Returns the number of leases this call released.
    pub fn release(&self) -> usize {
        if self.released.swap(true, Ordering::AcqRel) {
            return 0;
        }

        let leases: Vec<Arc<ResourceLease>> = self.lock().drain(..).collect();
        let released = leases
            .iter()
            .rev()
            .filter(|lease| lease.release())
            .count();

        tracing::debug!(released, "Resource guard released");
        released
    }
}

impl Drop for ResourceGuard {
    fn drop(&mut self) {
        self.release();
    }
}

fn safe_suffix(suffix: &str) -> String {
    let ext: String = suffix
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(MAX_SUFFIX_LEN)
        .collect();
    if ext.is_empty() {
        String::new()
    } else {
        format!(".{}", ext.to_ascii_lowercase())
    }
}
