use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

use crate::services::cache::CacheClient;
use crate::services::credentials::entry::CachedCredential;

/// Credential cache keyed by the raw bearer token.
///
/// Failure policy is fail-open: a backend error or an undecodable value reads as
/// a miss, so the caller re-introspects against the authoritative upstream.
/// Writes that fail are logged and dropped.
#[derive(Clone)]
pub struct CredentialCache {
    cache: Arc<dyn CacheClient>,
    // Optional key prefix to share a cache db with other services
    prefix: String,
}

impl CredentialCache {
    pub fn new(cache: Arc<dyn CacheClient>) -> Self {
        Self::new_with_prefix(cache, "")
    }

    pub fn new_with_prefix(cache: Arc<dyn CacheClient>, prefix: impl Into<String>) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
        }
    }

    pub fn key(&self, token: &str) -> String {
        if self.prefix.is_empty() {
            token.to_string()
        } else {
            format!("{}:{}", self.prefix, token)
        }
    }

    pub async fn read(&self, token: &str) -> Option<CachedCredential> {
        let raw = match self.cache.get_string(&self.key(token)).await {
            Ok(raw) => raw?,
            Err(err) => {
                tracing::warn!(
                    backend = self.cache.backend_name(),
                    token = %token_fingerprint(token),
                    error = %err,
                    "credential cache read failed, treating as miss"
                );
                return None;
            }
        };

        match serde_json::from_str::<CachedCredential>(&raw) {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(
                    token = %token_fingerprint(token),
                    error = %err,
                    "undecodable credential cache entry, treating as miss"
                );
                None
            }
        }
    }

    /// Persist `entry` for the rest of the token's lifetime.
    ///
    /// Returns `false` when nothing was written: the entry has no `exp`, is
    /// already expired, or the backend failed.
    pub async fn write(&self, token: &str, entry: &CachedCredential, now: i64) -> bool {
        let Some(ttl) = ttl_until(entry.token_info.exp, now) else {
            tracing::debug!(
                token = %token_fingerprint(token),
                "credential has no remaining lifetime, not caching"
            );
            return false;
        };

        let value = match serde_json::to_string(entry) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, "credential entry could not be encoded");
                return false;
            }
        };

        match self.cache.set_with_ttl(&self.key(token), &value, ttl).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(
                    backend = self.cache.backend_name(),
                    token = %token_fingerprint(token),
                    error = %err,
                    "credential cache write failed"
                );
                false
            }
        }
    }

    pub async fn delete(&self, token: &str) {
        if let Err(err) = self.cache.del(&self.key(token)).await {
            tracing::warn!(
                backend = self.cache.backend_name(),
                token = %token_fingerprint(token),
                error = %err,
                "credential cache delete failed"
            );
        }
    }
}

/// TTL for an entry expiring at `exp`, or `None` when it must not be cached.
pub fn ttl_until(exp: Option<i64>, now: i64) -> Option<Duration> {
    let remaining = exp?.checked_sub(now)?;
    u64::try_from(remaining)
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

/// Short, stable identifier for a token that is safe to log.
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{:x}", digest).chars().take(12).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cache::MemoryCache;
    use crate::services::identity::IntrospectionRecord;

    const NOW: i64 = 1_234_567_000;

    fn entry(exp: Option<i64>) -> CachedCredential {
        CachedCredential::new(IntrospectionRecord {
            active: true,
            exp,
            ..Default::default()
        })
    }

    #[test]
    fn ttl_is_remaining_lifetime() {
        assert_eq!(ttl_until(Some(1_234_567_890), NOW), Some(Duration::from_secs(890)));
        assert_eq!(ttl_until(None, NOW), None);
        assert_eq!(ttl_until(Some(NOW), NOW), None);
        assert_eq!(ttl_until(Some(NOW - 5), NOW), None);
    }

    #[test]
    fn extreme_exp_is_not_cached() {
        assert_eq!(ttl_until(Some(i64::MIN), 1_000), None);
        assert_eq!(ttl_until(Some(i64::MAX), -1_000), None);
    }

    #[tokio::test]
    async fn write_uses_exp_minus_now() {
        let backend = MemoryCache::new();
        let cache = CredentialCache::new(Arc::new(backend.clone()));
        let now = chrono::Utc::now().timestamp();

        assert!(cache.write("test-token", &entry(Some(now + 890)), now).await);

        let left = backend.expires_in("test-token").await.unwrap();
        assert!(left <= Duration::from_secs(890));
        assert!(left > Duration::from_secs(880));
        assert_eq!(cache.read("test-token").await, Some(entry(Some(now + 890))));
    }

    #[tokio::test]
    async fn write_without_exp_is_skipped() {
        let backend = MemoryCache::new();
        let cache = CredentialCache::new(Arc::new(backend.clone()));

        assert!(!cache.write("test-token", &entry(None), NOW).await);
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn garbage_reads_as_miss() {
        let backend = MemoryCache::new();
        backend
            .set_with_ttl("test-token", "{'key': 'value'}", Duration::from_secs(60))
            .await
            .unwrap();
        let cache = CredentialCache::new(Arc::new(backend));

        assert!(cache.read("test-token").await.is_none());
    }

    #[tokio::test]
    async fn prefix_namespaces_keys() {
        let backend = MemoryCache::new();
        let cache = CredentialCache::new_with_prefix(Arc::new(backend.clone()), "credential");
        let now = chrono::Utc::now().timestamp();

        cache.write("tok", &entry(Some(now + 60)), now).await;

        assert!(backend.get_string("credential:tok").await.unwrap().is_some());
        assert!(backend.get_string("tok").await.unwrap().is_none());

        cache.delete("tok").await;
        assert!(cache.read("tok").await.is_none());
    }

    #[test]
    fn fingerprint_is_short_and_stable() {
        let a = token_fingerprint("secret-token");
        assert_eq!(a.len(), 12);
        assert_eq!(a, token_fingerprint("secret-token"));
        assert_ne!(a, token_fingerprint("other-token"));
        assert!(!a.contains("secret"));
    }
}
