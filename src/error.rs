/*
 * Responsibility
 * - Application-wide ApiError definition
 * - IntoResponse (HTTP status + `{"detail": ...}` body)
 * - Conversions from service-layer errors (auth stages, secret store)
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// User-visible `detail` messages.
pub mod detail {
    pub const MISSING_TOKEN: &str = "Missing or invalid token";
    pub const TOKEN_NOT_ACTIVE: &str = "Token is not active";
    pub const TOKEN_WRONG_AUDIENCE: &str = "Token is not valid for this audience";
    pub const INTROSPECTION_FAILED: &str = "Introspection failed";
    pub const LICENCE_HEADER_MISSING: &str = "Licence header missing";
    pub const LICENCE_NOT_FOUND: &str = "Licence not found";
    pub const LICENCES_REQUEST_FAILED: &str = "Licences request failed";
    pub const ENTITY_NOT_FOUND: &str = "Entity not found";
    pub const SECRET_NOT_FOUND: &str = "Secret not found";
    pub const SECRET_STORE_UNAVAILABLE: &str = "Secret store unavailable";
    pub const REQUEST_TIMEOUT: &str = "Request timed out";
    pub const PAYLOAD_TOO_LARGE: &str = "Request body too large";
    pub const NOT_FOUND: &str = "Not found";
    pub const METHOD_NOT_ALLOWED: &str = "Method not allowed";
    pub const INTERNAL: &str = "Internal server error";
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthenticated(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    UpstreamUnavailable(&'static str),
    #[error("{0}")]
    InternalInconsistency(&'static str),
    #[error("{0}")]
    BadRequest(String),
    #[error("{}", detail::PAYLOAD_TOO_LARGE)]
    PayloadTooLarge,
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::UpstreamUnavailable(_)
            | AppError::InternalInconsistency(_)
            | AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn detail(&self) -> String {
        match self {
            AppError::Internal => detail::INTERNAL.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            detail: self.detail(),
        };

        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_status_codes() {
        let cases = [
            (AppError::Unauthenticated(detail::MISSING_TOKEN), 401),
            (AppError::Forbidden(detail::LICENCE_HEADER_MISSING), 403),
            (AppError::NotFound(detail::SECRET_NOT_FOUND), 404),
            (AppError::UpstreamUnavailable(detail::INTROSPECTION_FAILED), 500),
            (AppError::InternalInconsistency(detail::ENTITY_NOT_FOUND), 500),
            (AppError::BadRequest("bad".into()), 400),
            (AppError::PayloadTooLarge, 413),
            (AppError::Internal, 500),
        ];

        for (err, status) in cases {
            assert_eq!(err.status().as_u16(), status, "{err:?}");
        }
    }

    #[test]
    fn detail_is_the_message() {
        assert_eq!(
            AppError::Forbidden(detail::LICENCE_HEADER_MISSING).detail(),
            "Licence header missing"
        );
        assert_eq!(AppError::Internal.detail(), "Internal server error");
        assert_eq!(AppError::PayloadTooLarge.detail(), "Request body too large");
    }
}
