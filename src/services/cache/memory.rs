use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::services::cache::client::{CacheClient, CacheResult};

#[derive(Debug, Clone)]
struct Slot {
    value: String,
    expires_at: Instant,
}

const DEFAULT_SWEEP_THRESHOLD: usize = 1024;

/// In-process cache with per-key expiry.
///
/// Used for local runs (`CACHE_BACKEND=memory`) and tests; not shared between
/// replicas. Expired keys are invisible to readers. Once the map holds
/// `sweep_threshold` slots, every write first drops all expired ones.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    slots: Arc<RwLock<HashMap<String, Slot>>>,
    sweep_threshold: usize,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::with_sweep_threshold(DEFAULT_SWEEP_THRESHOLD)
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sweep_threshold(sweep_threshold: usize) -> Self {
        Self {
            slots: Arc::default(),
            sweep_threshold,
        }
    }

    /// Remaining lifetime of a live key.
    pub async fn expires_in(&self, key: &str) -> Option<Duration> {
        let slots = self.slots.read().await;
        slots
            .get(key)
            .and_then(|slot| slot.expires_at.checked_duration_since(Instant::now()))
    }

    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let slots = self.slots.read().await;
        slots.values().filter(|slot| slot.expires_at > now).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheClient for MemoryCache {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        let slots = self.slots.read().await;
        Ok(slots
            .get(key)
            .filter(|slot| slot.expires_at > Instant::now())
            .map(|slot| slot.value.clone()))
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        // Same clamp as the valkey backend.
        let ttl = ttl.max(Duration::from_secs(1));
        let now = Instant::now();
        let mut slots = self.slots.write().await;
        if slots.len() >= self.sweep_threshold {
            slots.retain(|_, slot| slot.expires_at > now);
        }
        slots.insert(
            key.to_string(),
            Slot {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<u64> {
        let mut slots = self.slots.write().await;
        Ok(match slots.remove(key) {
            Some(slot) if slot.expires_at > Instant::now() => 1,
            _ => 0,
        })
    }
}
