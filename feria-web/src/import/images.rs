//! Uploads directory listing with a bounded-lifetime cache
//!
//! Used to annotate which photo filenames from the spreadsheet are already
//! present on storage (the legacy single-photo-per-row flow). Listing a
//! large directory per row would be wasteful, so the listing is cached for
//! about a minute with an injected clock and explicit invalidation. Never a
//! validity criterion: a missing filename only produces a warning.

use super::catalog::{CacheEntry, Clock, SystemClock};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::debug;

const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// TTL-cached file listing of the uploads directory
pub struct ImageDirCache {
    dir: PathBuf,
    inner: RwLock<Option<CacheEntry<Arc<HashSet<String>>>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ImageDirCache {
    pub fn new(dir: PathBuf) -> Self {
        Self::with_clock(dir, Arc::new(SystemClock), DEFAULT_TTL)
    }

    pub fn with_clock(dir: PathBuf, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            dir,
            inner: RwLock::new(None),
            ttl,
            clock,
        }
    }

    /// Current set of filenames in the uploads directory.
    ///
    /// A missing or unreadable directory yields an empty set, not an error.
    pub fn filenames(&self) -> Arc<HashSet<String>> {
        let now = self.clock.now();

        if let Some(entry) = self.inner.read().expect("image cache poisoned").as_ref() {
            if let Some(names) = entry.get(now) {
                return names;
            }
        }

        let names = Arc::new(self.list_dir());
        debug!(count = names.len(), dir = %self.dir.display(), "Listed uploads directory");
        let mut guard = self.inner.write().expect("image cache poisoned");
        *guard = Some(CacheEntry::new(names.clone(), now, self.ttl));
        names
    }

    /// Whether a photo filename already exists on storage
    pub fn contains(&self, filename: &str) -> bool {
        self.filenames().contains(filename)
    }

    /// Drop the cached listing so the next call re-reads the directory
    pub fn invalidate(&self) {
        *self.inner.write().expect("image cache poisoned") = None;
    }

    fn list_dir(&self) -> HashSet<String> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return HashSet::new();
        };
        entries
            .flatten()
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|e| e.file_name().into_string().ok())
            .collect()
    }
}
