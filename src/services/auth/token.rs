//! Token verification stage: bearer token → introspection data → RequestCtx.
//!
//! extract → resolve (cache, else introspection) → validate → publish.
use axum::http::{HeaderMap, header};
use std::sync::Arc;

use crate::services::auth::context::RequestCtx;
use crate::services::auth::error::AuthError;
use crate::services::credentials::{CachedCredential, CredentialCache, token_fingerprint};
use crate::services::identity::{IdentityProvider, IntrospectionRecord};
use crate::services::licenses::filter_current;

pub struct TokenVerifier {
    cache: CredentialCache,
    provider: Arc<dyn IdentityProvider>,
    audience: String,
    // Minimum age (seconds) of a cached entry before `Cache-Control: no-cache`
    // is honoured; 0 honours every request.
    forced_refresh_interval: i64,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("audience", &self.audience)
            .field("forced_refresh_interval", &self.forced_refresh_interval)
            .finish()
    }
}

/// `Authorization: Bearer <token>`, nothing more and nothing less.
pub fn extract_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let token = value.strip_prefix("Bearer ").ok_or(AuthError::MissingToken)?;

    if token.is_empty() || token.contains(' ') {
        return Err(AuthError::MissingToken);
    }

    Ok(token)
}

impl TokenVerifier {
    pub fn new(
        cache: CredentialCache,
        provider: Arc<dyn IdentityProvider>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            provider,
            audience: audience.into(),
            forced_refresh_interval: 0,
        }
    }

    pub fn with_forced_refresh_interval(mut self, seconds: u64) -> Self {
        self.forced_refresh_interval = i64::try_from(seconds).unwrap_or(i64::MAX);
        self
    }

    /// Cache hit → cached entry, no upstream call.
    /// Miss → introspect, stamp `cached_time`, persist for `exp - now` seconds.
    pub async fn resolve_token_info(
        &self,
        token: &str,
        now: i64,
    ) -> Result<CachedCredential, AuthError> {
        if let Some(entry) = self.cache.read(token).await {
            tracing::debug!(token = %token_fingerprint(token), "credential cache hit");
            return Ok(entry);
        }

        let mut token_info = self
            .provider
            .introspect(token)
            .await
            .map_err(AuthError::Introspection)?;
        token_info.cached_time = Some(now);

        let entry = CachedCredential::new(token_info);
        let cached = self.cache.write(token, &entry, now).await;
        tracing::debug!(token = %token_fingerprint(token), cached, "token introspected");

        Ok(entry)
    }

    /// Drop whatever is cached for `token` and introspect again.
    pub async fn reintrospect(&self, token: &str, now: i64) -> Result<CachedCredential, AuthError> {
        self.cache.delete(token).await;
        self.resolve_token_info(token, now).await
    }

    /// Client-requested fresh introspection. An entry introspected less than
    /// `forced_refresh_interval` seconds ago is served as is.
    pub async fn forced_refresh(&self, token: &str, now: i64) -> Result<CachedCredential, AuthError> {
        if self.forced_refresh_interval > 0 {
            if let Some(entry) = self.cache.read(token).await {
                let recent = entry
                    .token_info
                    .cached_time
                    .is_some_and(|t| now.saturating_sub(t) < self.forced_refresh_interval);
                if recent {
                    tracing::debug!(
                        token = %token_fingerprint(token),
                        "forced refresh within interval, serving cached entry"
                    );
                    return Ok(entry);
                }
            }
        }

        self.reintrospect(token, now).await
    }

    pub fn validate(&self, token_info: &IntrospectionRecord, now: i64) -> Result<(), AuthError> {
        if !token_info.active || !token_info.is_within_window(now) {
            return Err(AuthError::InactiveToken);
        }
        if !token_info.has_audience(&self.audience) {
            return Err(AuthError::WrongAudience {
                expected: self.audience.clone(),
            });
        }
        Ok(())
    }

    /// Identity facts for the rest of the pipeline. Cached licences are
    /// re-filtered: one that lapsed since it was cached is not carried over.
    pub fn publish_identity(token: &str, entry: CachedCredential, now: i64) -> RequestCtx {
        let licenses = filter_current(&entry.licenses, now);
        RequestCtx::new(token, entry.token_info, licenses)
    }

    /// Whole stage for one request.
    pub async fn verify(
        &self,
        headers: &HeaderMap,
        force_fresh: bool,
        now: i64,
    ) -> Result<RequestCtx, AuthError> {
        let token = extract_token(headers)?;

        let entry = if force_fresh {
            self.forced_refresh(token, now).await?
        } else {
            self.resolve_token_info(token, now).await?
        };

        self.validate(&entry.token_info, now)?;

        Ok(Self::publish_identity(token, entry, now))
    }
}
