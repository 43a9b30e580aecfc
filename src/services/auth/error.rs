use thiserror::Error;

use crate::error::{AppError, detail};
use crate::services::upstream::UpstreamError;

/// Failures of the token and licence stages.
///
/// Logged with full context at the middleware boundary, then reduced to an
/// `AppError` whose `detail` is safe to show to the caller.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing or malformed authorization header")]
    MissingToken,
    #[error("token is not active")]
    InactiveToken,
    #[error("token audience does not include {expected}")]
    WrongAudience { expected: String },
    #[error("token introspection failed: {0}")]
    Introspection(#[source] UpstreamError),

    #[error("licence header missing")]
    MissingLicenceHeader,
    #[error("licence {0} not found")]
    LicenceNotFound(String),
    #[error("licences request failed: {0}")]
    Licences(#[source] UpstreamError),
    #[error("no entity found for licence {0}")]
    EntityNotFound(String),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingToken => AppError::Unauthenticated(detail::MISSING_TOKEN),
            AuthError::InactiveToken => AppError::Unauthenticated(detail::TOKEN_NOT_ACTIVE),
            AuthError::WrongAudience { .. } => {
                AppError::Unauthenticated(detail::TOKEN_WRONG_AUDIENCE)
            }
            AuthError::Introspection(_) => {
                AppError::UpstreamUnavailable(detail::INTROSPECTION_FAILED)
            }
            AuthError::MissingLicenceHeader => {
                AppError::Forbidden(detail::LICENCE_HEADER_MISSING)
            }
            AuthError::LicenceNotFound(_) => AppError::Forbidden(detail::LICENCE_NOT_FOUND),
            AuthError::Licences(_) => AppError::UpstreamUnavailable(detail::LICENCES_REQUEST_FAILED),
            AuthError::EntityNotFound(_) => {
                AppError::InternalInconsistency(detail::ENTITY_NOT_FOUND)
            }
        }
    }
}
