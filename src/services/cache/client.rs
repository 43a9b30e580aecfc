//! Cache client interface used by the credential cache.
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-layer errors (transport/command/timeout).
///
/// Note:
/// - Kept independent from `AppError`. The credential cache treats every one of
///   these as a miss and falls back to the upstream, which stays authoritative.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection error: {0}")]
    BackendConnection(String),
    #[error("cache command error: {0}")]
    BackendCommand(String),
    #[error("cache command timed out")]
    Timeout,
}

/// A minimal single-key cache interface.
///
/// Every operation touches exactly one key; there are no multi-key transactions
/// and no partial updates, so callers need no locking of their own.
#[async_trait]
pub trait CacheClient: Send + Sync + 'static {
    // Returns the cache backend name (for logging).
    fn backend_name(&self) -> &'static str;

    // Get UTF-8 string value.
    async fn get_string(&self, key: &str) -> CacheResult<Option<String>>;

    // Set value unconditionally, replacing any previous one, with TTL.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    // Delete a key. Returns number of deleted keys.
    async fn del(&self, key: &str) -> CacheResult<u64>;
}
