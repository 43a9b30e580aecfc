//! Licence verification stage: `X-License-Key` → authorized licence → owning entity.
//!
//! Two-phase check: local lookup in the licences carried by the context, then at
//! most one refresh from the registry, then the final lookup.
use axum::http::HeaderMap;
use std::sync::Arc;

use crate::services::auth::context::RequestCtx;
use crate::services::auth::error::AuthError;
use crate::services::credentials::{CachedCredential, CredentialCache, token_fingerprint};
use crate::services::licenses::{LicenseRegistry, RawLicenseCandidate, filter_current};

pub const LICENCE_HEADER: &str = "x-license-key";

pub struct LicenceVerifier {
    cache: CredentialCache,
    registry: Arc<dyn LicenseRegistry>,
}

impl std::fmt::Debug for LicenceVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenceVerifier").finish_non_exhaustive()
    }
}

pub fn extract_license_key(headers: &HeaderMap) -> Result<&str, AuthError> {
    headers
        .get(LICENCE_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::MissingLicenceHeader)
}

pub fn find_license(ctx: &RequestCtx, license_uuid: &str) -> bool {
    ctx.license(license_uuid).is_some()
}

/// Owner of the licence the context was authorized for.
pub fn resolve_entity(ctx: &RequestCtx) -> Result<String, AuthError> {
    let license_uuid = ctx.license_uuid.as_deref().unwrap_or_default();

    ctx.license(license_uuid)
        .and_then(|license| license.entity_uuid.clone())
        .filter(|entity| !entity.is_empty())
        .ok_or_else(|| AuthError::EntityNotFound(license_uuid.to_string()))
}

impl LicenceVerifier {
    pub fn new(cache: CredentialCache, registry: Arc<dyn LicenseRegistry>) -> Self {
        Self { cache, registry }
    }

    pub async fn fetch_licenses(&self, token: &str) -> Result<Vec<RawLicenseCandidate>, AuthError> {
        self.registry.mine(token).await.map_err(AuthError::Licences)
    }

    /// Re-fetch the caller's licences and write them back into the cached entry
    /// for the token (read-modify-write of the whole entry).
    ///
    /// When the entry is gone (expired between stages, or never cacheable) it is
    /// rebuilt from the introspection record already validated for this request.
    pub async fn refresh(&self, ctx: &mut RequestCtx, now: i64) -> Result<(), AuthError> {
        let candidates = self.fetch_licenses(&ctx.raw_token).await?;
        ctx.licenses = filter_current(&candidates, now);

        let entry = self
            .cache
            .read(&ctx.raw_token)
            .await
            .unwrap_or_else(|| CachedCredential::new(ctx.token_info.clone()))
            .with_licenses(&ctx.licenses);
        let cached = self.cache.write(&ctx.raw_token, &entry, now).await;

        tracing::info!(
            token = %token_fingerprint(&ctx.raw_token),
            licences = ctx.licenses.len(),
            cached,
            "licences refreshed"
        );
        Ok(())
    }

    pub async fn authorize(
        &self,
        ctx: &mut RequestCtx,
        license_uuid: &str,
        now: i64,
    ) -> Result<(), AuthError> {
        if find_license(ctx, license_uuid) {
            return Ok(());
        }

        self.refresh(ctx, now).await?;

        if find_license(ctx, license_uuid) {
            Ok(())
        } else {
            Err(AuthError::LicenceNotFound(license_uuid.to_string()))
        }
    }

    /// Whole stage for one request; fills `license_uuid` and `entity_uuid`.
    pub async fn verify(
        &self,
        headers: &HeaderMap,
        ctx: &mut RequestCtx,
        now: i64,
    ) -> Result<(), AuthError> {
        let license_uuid = extract_license_key(headers)?;

        self.authorize(ctx, license_uuid, now).await?;
        ctx.license_uuid = Some(license_uuid.to_string());

        let entity_uuid = resolve_entity(ctx)?;
        ctx.entity_uuid = Some(entity_uuid);
        Ok(())
    }
}
