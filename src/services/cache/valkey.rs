use async_trait::async_trait;
use std::time::Duration;

use crate::services::cache::client::{CacheClient, CacheError, CacheResult};

/// Valkey/Redis-backend cache client.
///
/// Each command is bounded by `command_timeout`; an elapsed timeout surfaces as
/// `CacheError::Timeout` instead of stalling the request.
#[derive(Clone)]
pub struct ValkeyClient {
    manager: redis::aio::ConnectionManager,
    command_timeout: Duration,
}

impl std::fmt::Debug for ValkeyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The connection url may carry the password; keep it out of Debug output.
        f.debug_struct("ValkeyClient")
            .field("command_timeout", &self.command_timeout)
            .finish()
    }
}

impl ValkeyClient {
    // Create a Valkey client from a URL like `redis://:password@localhost:6379/0`
    pub async fn new(url: &str, command_timeout: Duration) -> Result<Self, CacheError> {
        let client =
            redis::Client::open(url).map_err(|e| CacheError::BackendConnection(e.to_string()))?;

        let manager = tokio::time::timeout(command_timeout, client.get_connection_manager())
            .await
            .map_err(|_| CacheError::Timeout)?
            .map_err(|e| CacheError::BackendConnection(e.to_string()))?;

        Ok(Self {
            manager,
            command_timeout,
        })
    }

    async fn query<T>(&self, cmd: &redis::Cmd) -> CacheResult<T>
    where
        T: redis::FromRedisValue + Send,
    {
        // ConnectionManager is a cheap handle; clone per command.
        let mut conn = self.manager.clone();

        match tokio::time::timeout(self.command_timeout, cmd.query_async::<T>(&mut conn)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(CacheError::BackendCommand(e.to_string())),
            Err(_) => Err(CacheError::Timeout),
        }
    }
}

#[async_trait]
impl CacheClient for ValkeyClient {
    fn backend_name(&self) -> &'static str {
        "valkey"
    }

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        self.query::<Option<String>>(&cmd).await
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        // EX expects integer seconds. We clamp to at least 1 sec.
        let ttl_seconds: u64 = ttl.as_secs().max(1);

        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("EX").arg(ttl_seconds);
        self.query::<()>(&cmd).await
    }

    async fn del(&self, key: &str) -> CacheResult<u64> {
        // DEL returns number of keys removed (0 or 1 for a single key).
        let mut cmd = redis::cmd("DEL");
        cmd.arg(key);
        self.query::<u64>(&cmd).await
    }
}
