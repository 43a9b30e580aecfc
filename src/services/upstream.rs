//! Shared plumbing for outbound HTTP calls (identity provider, licence registry, vault).
//!
//! Every upstream call goes through a `reqwest::Client` built here, so each one
//! carries its own bounded timeout. A timeout is reported like any other failure.
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request timed out")]
    Timeout,
    #[error("upstream responded with status {0}")]
    Status(u16),
    #[error("upstream transport error: {0}")]
    Transport(String),
    #[error("upstream response could not be decoded: {0}")]
    Decode(String),
    #[error("invalid upstream url: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UpstreamError::Timeout
        } else if e.is_decode() {
            UpstreamError::Decode(e.to_string())
        } else {
            UpstreamError::Transport(e.to_string())
        }
    }
}

impl From<url::ParseError> for UpstreamError {
    fn from(e: url::ParseError) -> Self {
        UpstreamError::InvalidUrl(e.to_string())
    }
}

/// Build an HTTP client whose every request is bounded by `timeout`.
/// Redirects are never followed.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, UpstreamError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| UpstreamError::Transport(e.to_string()))
}

/// Join `segments` onto `base` as path segments (no encoding surprises, no double slashes).
pub fn join_url(base: &str, segments: &[&str]) -> Result<url::Url, UpstreamError> {
    let mut url = url::Url::parse(base)?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| UpstreamError::InvalidUrl(base.to_string()))?;
        path.pop_if_empty();
        for segment in segments {
            for part in segment.split('/').filter(|p| !p.is_empty()) {
                path.push(part);
            }
        }
    }
    Ok(url)
}
