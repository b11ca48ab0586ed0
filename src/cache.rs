//! TTL-gated disk cache for source documents
//!
//! Each logical source (installed formulae, remote casks, analytics, ...)
//! persists its last fetched payload as one file, timestamped by file
//! modification time. Freshness is measured in ticks (minutes): a read is a
//! hit only when the document's age is strictly less than the caller's
//! budget. Anything that goes wrong on the read path (missing file,
//! unreadable metadata, clock skew) is a miss, never an error; callers
//! always fall through to a live fetch.

use crate::error::{CacheError, Result};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// Cache document names, one per logical source.
pub mod document {
    pub const INSTALLED_FORMULAE: &str = "installed.json";
    pub const INSTALLED_CASKS: &str = "installed-casks.json";
    pub const REMOTE_FORMULAE: &str = "formula.json";
    pub const REMOTE_CASKS: &str = "cask.json";
    pub const FORMULA_ANALYTICS: &str = "analytics.json";
    pub const CASK_ANALYTICS: &str = "cask-analytics.json";
    pub const TAP_PACKAGES: &str = "tap-packages.json";
}

/// Whole-document blob store keyed by logical name.
///
/// Not a key-value store: entries are complete fetched payloads, replaced
/// wholesale on every write. Safe for sequential access from any single
/// task at a time; the refresh orchestrator fetches sources one after
/// another, so no per-document write serialization is needed here.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the cache directory. Idempotent and safe to call repeatedly.
    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|_| CacheError::DirectoryUnavailable {
                path: self.dir.clone(),
            })?;
        Ok(())
    }

    /// Read a cached document if it is younger than `max_age_ticks` minutes.
    ///
    /// Returns `None` on miss: absent file, stale file, or any read error.
    pub async fn read(&self, name: &str, max_age_ticks: u64) -> Option<Vec<u8>> {
        let path = self.dir.join(name);

        let metadata = tokio::fs::metadata(&path).await.ok()?;
        let modified = metadata.modified().ok()?;
        let age = SystemTime::now().duration_since(modified).ok()?;

        let age_ticks = age.as_secs() / 60;
        if age_ticks >= max_age_ticks {
            debug!(
                "cache miss (stale): {} is {} ticks old, budget {}",
                name, age_ticks, max_age_ticks
            );
            return None;
        }

        match tokio::fs::read(&path).await {
            Ok(data) => {
                debug!("cache hit: {} ({} bytes)", name, data.len());
                Some(data)
            }
            Err(e) => {
                debug!("cache miss (unreadable): {}: {}", name, e);
                None
            }
        }
    }

    /// Write a document, replacing any previous content.
    ///
    /// Failures are returned for logging but must be treated as non-fatal:
    /// the cache is an optimization, not a correctness requirement.
    pub async fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        self.ensure_dir().await?;
        let path = self.dir.join(name);
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| CacheError::WriteFailed {
                name: name.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    /// Write a document, logging and swallowing any failure.
    pub async fn write_best_effort(&self, name: &str, data: &[u8]) {
        if let Err(e) = self.write(name, data).await {
            warn!("cache write ignored: {}", e);
        }
    }
}
