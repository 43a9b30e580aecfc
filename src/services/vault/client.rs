use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::services::upstream::{UpstreamError, http_client, join_url};

/// Flat secret payload stored at one vault path.
pub type SecretData = BTreeMap<String, String>;

/// Versioned key-value secret storage.
#[async_trait]
pub trait SecretVault: Send + Sync + 'static {
    /// Latest version at `path`, or `None` when nothing is stored there.
    async fn read(&self, path: &str) -> Result<Option<SecretData>, UpstreamError>;

    /// Store `data` as a new version at `path`.
    async fn write(&self, path: &str, data: &SecretData) -> Result<(), UpstreamError>;
}

/// Vault KV v2 response envelope: `{"data": {"data": {...}, "metadata": {...}}}`.
#[derive(Debug, Deserialize)]
struct KvReadResponse {
    data: KvReadData,
}

#[derive(Debug, Deserialize)]
struct KvReadData {
    #[serde(default)]
    data: Option<SecretData>,
}

#[derive(Debug, Serialize)]
struct KvWriteRequest<'a> {
    data: &'a SecretData,
}

/// HashiCorp Vault KV v2 client for a single mount.
#[derive(Clone)]
pub struct VaultKvClient {
    base_url: String,
    token: String,
    mount: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for VaultKvClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print the vault token
        f.debug_struct("VaultKvClient")
            .field("base_url", &self.base_url)
            .field("mount", &self.mount)
            .finish()
    }
}

impl VaultKvClient {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        mount: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        Ok(Self {
            base_url: base_url.into(),
            token: token.into(),
            mount: mount.into(),
            http: http_client(timeout)?,
        })
    }

    /// `{base}/v1/{mount}/data/{path}`
    pub fn data_url(&self, path: &str) -> Result<url::Url, UpstreamError> {
        join_url(&self.base_url, &["v1", &self.mount, "data", path])
    }
}

#[async_trait]
impl SecretVault for VaultKvClient {
    async fn read(&self, path: &str) -> Result<Option<SecretData>, UpstreamError> {
        let response = self
            .http
            .get(self.data_url(path)?)
            .header("X-Vault-Token", &self.token)
            .send()
            .await?;

        // KV v2 answers 404 both for unknown paths and for deleted latest versions.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(UpstreamError::Status(response.status().as_u16()));
        }

        let body: KvReadResponse = response.json().await?;
        Ok(body.data.data)
    }

    async fn write(&self, path: &str, data: &SecretData) -> Result<(), UpstreamError> {
        let response = self
            .http
            .post(self.data_url(path)?)
            .header("X-Vault-Token", &self.token)
            .json(&KvWriteRequest { data })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UpstreamError::Status(response.status().as_u16()));
        }

        Ok(())
    }
}
