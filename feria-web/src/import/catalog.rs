//! Catalog lookup with a short-lived owned cache
//!
//! The zone/category name→id data is read-heavy and effectively static per
//! import request, so it is loaded once per import call and cached for a
//! bounded duration. The cache owns its state, takes an injected clock, and
//! exposes explicit invalidation, so TTL behavior is testable without
//! wall-clock sleeps. If the database lookup fails, the built-in default
//! catalog is used instead of failing the import.

use feria_common::db::init::{default_categories, default_zones};
use feria_common::CatalogEntry;
use sqlx::{Pool, Sqlite};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::warn;

/// Default TTL for the catalog snapshot. The catalog changes rarely; a
/// minute of staleness is acceptable.
const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Time source, injectable for tests
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock time
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A cached value with its expiration time
pub(crate) struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
}

impl<T: Clone> CacheEntry<T> {
    pub(crate) fn new(value: T, now: Instant, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: now + ttl,
        }
    }

    pub(crate) fn get(&self, now: Instant) -> Option<T> {
        if now >= self.expires_at {
            None
        } else {
            Some(self.value.clone())
        }
    }
}

/// Zones and categories loaded together in one round trip
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub categories: Vec<CatalogEntry>,
    pub zones: Vec<CatalogEntry>,
}

/// Owned TTL cache for the reference catalog
pub struct CatalogCache {
    inner: RwLock<Option<CacheEntry<CatalogSnapshot>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock), DEFAULT_TTL)
    }

    pub fn with_clock(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(None),
            ttl,
            clock,
        }
    }

    /// Return the cached snapshot, or load it from the database.
    ///
    /// On lookup failure the seeded default catalog is returned (and not
    /// cached), so one bad query never fails a whole import.
    pub async fn get_or_load(&self, db: &Pool<Sqlite>) -> CatalogSnapshot {
        let now = self.clock.now();

        if let Some(entry) = self.inner.read().expect("catalog cache poisoned").as_ref() {
            if let Some(snapshot) = entry.get(now) {
                return snapshot;
            }
        }

        match load_catalog(db).await {
            Ok(snapshot) => {
                let mut guard = self.inner.write().expect("catalog cache poisoned");
                *guard = Some(CacheEntry::new(snapshot.clone(), now, self.ttl));
                snapshot
            }
            Err(e) => {
                warn!("Catalog lookup failed, using default catalog: {}", e);
                CatalogSnapshot {
                    categories: default_categories(),
                    zones: default_zones(),
                }
            }
        }
    }

    /// Drop the cached snapshot so the next call reloads
    pub fn invalidate(&self) {
        *self.inner.write().expect("catalog cache poisoned") = None;
    }
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}

async fn load_catalog(db: &Pool<Sqlite>) -> feria_common::Result<CatalogSnapshot> {
    let categories =
        sqlx::query_as::<_, CatalogEntry>("SELECT id, name, slug FROM categories ORDER BY id")
            .fetch_all(db)
            .await?;
    let zones = sqlx::query_as::<_, CatalogEntry>("SELECT id, name, slug FROM zones ORDER BY id")
        .fetch_all(db)
        .await?;

    Ok(CatalogSnapshot { categories, zones })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Manually advanced clock for TTL tests
    pub struct ManualClock {
        now: Mutex<Instant>,
    }

    impl ManualClock {
        pub fn new() -> Self {
            Self {
                now: Mutex::new(Instant::now()),
            }
        }

        pub fn advance(&self, d: Duration) {
            let mut now = self.now.lock().unwrap();
            *now += d;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            *self.now.lock().unwrap()
        }
    }

    #[test]
    fn cache_entry_expires_at_ttl() {
        let start = Instant::now();
        let entry = CacheEntry::new(42u32, start, Duration::from_secs(60));

        assert_eq!(entry.get(start), Some(42));
        assert_eq!(entry.get(start + Duration::from_secs(59)), Some(42));
        assert_eq!(entry.get(start + Duration::from_secs(60)), None);
    }

    #[tokio::test]
    async fn snapshot_is_cached_within_ttl_and_reloaded_after() {
        let db = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::query("CREATE TABLE categories (id INTEGER PRIMARY KEY, name TEXT, slug TEXT)")
            .execute(&db)
            .await
            .unwrap();
        sqlx::query("CREATE TABLE zones (id INTEGER PRIMARY KEY, name TEXT, slug TEXT)")
            .execute(&db)
            .await
            .unwrap();
        sqlx::query("INSERT INTO categories (id, name, slug) VALUES (1, 'Inmuebles', 'inmuebles')")
            .execute(&db)
            .await
            .unwrap();

        let clock = Arc::new(ManualClock::new());
        let cache = CatalogCache::with_clock(clock.clone(), Duration::from_secs(60));

        let snap = cache.get_or_load(&db).await;
        assert_eq!(snap.categories.len(), 1);

        // Mutation within the TTL is not observed
        sqlx::query("INSERT INTO categories (id, name, slug) VALUES (2, 'Hogar', 'hogar')")
            .execute(&db)
            .await
            .unwrap();
        let snap = cache.get_or_load(&db).await;
        assert_eq!(snap.categories.len(), 1);

        // After the TTL the snapshot reloads
        clock.advance(Duration::from_secs(61));
        let snap = cache.get_or_load(&db).await;
        assert_eq!(snap.categories.len(), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_reload() {
        let db = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::query("CREATE TABLE categories (id INTEGER PRIMARY KEY, name TEXT, slug TEXT)")
            .execute(&db)
            .await
            .unwrap();
        sqlx::query("CREATE TABLE zones (id INTEGER PRIMARY KEY, name TEXT, slug TEXT)")
            .execute(&db)
            .await
            .unwrap();

        let cache = CatalogCache::new();
        let snap = cache.get_or_load(&db).await;
        assert_eq!(snap.categories.len(), 0);

        sqlx::query("INSERT INTO categories (id, name, slug) VALUES (1, 'Inmuebles', 'inmuebles')")
            .execute(&db)
            .await
            .unwrap();
        cache.invalidate();
        let snap = cache.get_or_load(&db).await;
        assert_eq!(snap.categories.len(), 1);
    }

    #[tokio::test]
    async fn lookup_failure_falls_back_to_default_catalog() {
        // No tables at all - the load query fails
        let db = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();

        let cache = CatalogCache::new();
        let snap = cache.get_or_load(&db).await;
        assert!(!snap.categories.is_empty());
        assert!(!snap.zones.is_empty());
        assert!(snap.categories.iter().any(|c| c.name == "Inmuebles"));
    }

}
