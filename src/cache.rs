//! Disk-backed response cache
//!
//! Entries are postcard-encoded together with an absolute expiry and kept in
//! a single fjall keyspace. Expired entries are dropped lazily on read.

use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use fjall::Keyspace;
use rand::RngExt;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::task;

const KEYSPACE: &str = "responses";

#[derive(Serialize, Deserialize)]
struct CacheEntry<T> {
    expires_at: u64,
    value: T,
}

impl<T> CacheEntry<T> {
    fn is_fresh(&self, now: u64) -> bool {
        now < self.expires_at
    }
}

fn unix_now() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

/// Spread expiries by ±10% so entries written together do not expire together
#[must_use]
pub fn jittered(ttl: Duration) -> Duration {
    let factor: f64 = rand::rng().random_range(0.9..1.1);
    ttl.mul_f64(factor)
}

/// On-disk key/value store with per-entry expiry.
///
/// Cloning is cheap; clones share the same keyspace.
#[derive(Clone)]
pub struct PersistentCache {
    entries: Keyspace,
}

impl PersistentCache {
    /// Open (or create) the cache database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = fjall::Database::builder(path)
            .open()
            .with_context(|| format!("Failed to open cache database {}", path.display()))?;
        let entries = db.keyspace(KEYSPACE, fjall::KeyspaceCreateOptions::default)?;
        Ok(Self { entries })
    }

    #[tracing::instrument(name = "cache_put", level = "debug", skip(self, value))]
    pub async fn put<T: Serialize + Send + 'static>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> Result<()> {
        let expires_at = unix_now()?.saturating_add(ttl.as_secs());
        let bytes = postcard::to_stdvec(&CacheEntry { expires_at, value })?;

        let entries = self.entries.clone();
        let key = key.as_bytes().to_vec();
        task::spawn_blocking(move || entries.insert(key, bytes)).await??;
        Ok(())
    }

    /// Fresh value stored under `key`, if any
    #[tracing::instrument(name = "cache_get", level = "debug", skip(self))]
    pub async fn get<T: DeserializeOwned + Send + 'static>(&self, key: &str) -> Result<Option<T>> {
        let entries = self.entries.clone();
        let lookup = key.as_bytes().to_vec();
        let stored = task::spawn_blocking(move || {
            entries
                .get(lookup)
                .map(|slice| slice.map(|bytes| bytes.to_vec()))
        })
        .await??;

        let Some(bytes) = stored else {
            tracing::debug!("Cache miss");
            return Ok(None);
        };

        let entry: CacheEntry<T> = postcard::from_bytes(&bytes)?;
        if entry.is_fresh(unix_now()?) {
            tracing::debug!("Cache hit");
            return Ok(Some(entry.value));
        }

        tracing::debug!("Cache entry expired");
        self.remove(key).await?;
        Ok(None)
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        let entries = self.entries.clone();
        let key = key.as_bytes().to_vec();
        task::spawn_blocking(move || entries.remove(key)).await??;
        Ok(())
    }
}
