use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::services::licenses::model::RawLicenseCandidate;
use crate::services::upstream::{UpstreamError, http_client, join_url};

/// Source of the caller's licence grants.
#[async_trait]
pub trait LicenseRegistry: Send + Sync + 'static {
    /// Licences visible to the bearer of `token` ("mine").
    async fn mine(&self, token: &str) -> Result<Vec<RawLicenseCandidate>, UpstreamError>;
}

#[derive(Debug, Deserialize)]
struct MineResponse {
    #[serde(default)]
    data: Value,
}

impl MineResponse {
    // A missing or non-array payload degrades to an empty list.
    fn into_candidates(self) -> Vec<RawLicenseCandidate> {
        match self.data {
            Value::Array(items) => items.into_iter().map(RawLicenseCandidate).collect(),
            _ => Vec::new(),
        }
    }
}

/// Licence registry reached through the API gateway.
#[derive(Debug, Clone)]
pub struct HttpLicenseRegistry {
    mine_url: url::Url,
    http: reqwest::Client,
}

impl HttpLicenseRegistry {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        Ok(Self {
            mine_url: join_url(base_url, &["license", "v1", "mine"])?,
            http: http_client(timeout)?,
        })
    }
}

#[async_trait]
impl LicenseRegistry for HttpLicenseRegistry {
    async fn mine(&self, token: &str) -> Result<Vec<RawLicenseCandidate>, UpstreamError> {
        let response = self
            .http
            .get(self.mine_url.clone())
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UpstreamError::Status(response.status().as_u16()));
        }

        let body: MineResponse = response.json().await?;
        Ok(body.into_candidates())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: Value) -> Vec<RawLicenseCandidate> {
        serde_json::from_value::<MineResponse>(body)
            .unwrap()
            .into_candidates()
    }

    #[test]
    fn data_array_becomes_candidates() {
        let candidates = parse(json!({"data": [{"uuid": "a"}, "junk"]}));
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1], RawLicenseCandidate(json!("junk")));
    }

    #[test]
    fn missing_or_odd_payload_is_empty() {
        assert!(parse(json!({})).is_empty());
        assert!(parse(json!({"data": null})).is_empty());
        assert!(parse(json!({"data": {"uuid": "a"}})).is_empty());
    }
}
