use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::{AppError, detail};
use crate::services::auth::RequestCtx;
use crate::state::AppState;

use super::LicenceScope;

/// middleware が RequestCtx を request.extensions() に insert 済みである前提
/// - ctx 自体が無い: token stage を通っていない → 401
/// - licence / entity が無い: licence stage を通っていない → 500
impl FromRequestParts<AppState> for LicenceScope {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ctx = parts
            .extensions
            .get::<RequestCtx>()
            .cloned()
            .ok_or(AppError::Unauthenticated(detail::MISSING_TOKEN))?;

        let (Some(license_uuid), Some(entity_uuid)) =
            (ctx.license_uuid.clone(), ctx.entity_uuid.clone())
        else {
            tracing::error!(path = %parts.uri.path(), "handler reached without a licence scope");
            return Err(AppError::InternalInconsistency(detail::ENTITY_NOT_FOUND));
        };

        Ok(LicenceScope {
            entity_uuid,
            license_uuid,
            ctx,
        })
    }
}
