use crate::error::{AppError, detail};
use crate::services::auth::RequestCtx;

/// Scope a licensed request operates in.
///
/// `entity_uuid` / `license_uuid` are what the licence stage published; the
/// full context stays available for handlers that address another licence.
#[derive(Debug, Clone)]
pub struct LicenceScope {
    pub entity_uuid: String,
    pub license_uuid: String,
    pub ctx: RequestCtx,
}

impl LicenceScope {
    /// Owning entity of another of the caller's current licences.
    pub fn entity_of(&self, license_uuid: &str) -> Result<&str, AppError> {
        let license = self
            .ctx
            .license(license_uuid)
            .ok_or(AppError::Forbidden(detail::LICENCE_NOT_FOUND))?;

        license
            .entity_uuid
            .as_deref()
            .filter(|entity| !entity.is_empty())
            .ok_or(AppError::InternalInconsistency(detail::ENTITY_NOT_FOUND))
    }
}
