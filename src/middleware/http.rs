//! HTTP-level middleware (cross-cutting concerns).
//!
//! Transport/infrastructure concerns that apply to every route, including the
//! ones the auth pipeline lets through.
//!
//! Responsibility:
//! - Request-Id generation + propagation (X-Request-Id)
//! - Access logging / request tracing (TraceLayer)
//! - Body size limits
//! - Global timeouts (`{"detail": "Request timed out"}` with 408)
//! - `{"detail": ...}` bodies for the 404/405/413 that routing and the body
//!   limit produce on their own

use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::http::{StatusCode, header, header::HeaderName};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::error::{AppError, ErrorResponse, detail};

#[derive(Debug, Clone, Copy)]
pub struct HttpLimits {
    pub request_timeout: Duration,
    pub body_limit_bytes: usize,
}

impl Default for HttpLimits {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            body_limit_bytes: 64 * 1024,
        }
    }
}

/// Apply HTTP-level middleware to the given Router.
///
/// Request-Id header: `x-request-id`
pub fn apply(router: Router, limits: HttpLimits) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");

    let layers = ServiceBuilder::new()
        // Make the service error `Infallible` by converting errors into responses.
        .layer(HandleErrorLayer::new(|err: BoxError| async move {
            if err.is::<tower::timeout::error::Elapsed>() {
                tracing::warn!("request timed out");
                let body = ErrorResponse {
                    detail: detail::REQUEST_TIMEOUT.to_string(),
                };
                (StatusCode::REQUEST_TIMEOUT, Json(body)).into_response()
            } else {
                tracing::error!(error = %err, "unhandled middleware error");
                AppError::Internal.into_response()
            }
        }))
        // Generate a request id if missing, then propagate it to the response.
        .layer(SetRequestIdLayer::new(
            request_id_header.clone(),
            MakeRequestUuid,
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header))
        .layer(RequestBodyLimitLayer::new(limits.body_limit_bytes))
        .layer(TimeoutLayer::new(limits.request_timeout))
        // Access log / tracing for all requests.
        .layer(TraceLayer::new_for_http());

    router
        .layer(layers)
        .layer(axum::middleware::map_response(json_error_body))
}

/// Replace the empty or plain-text body of a routing 404/405 or a body-limit
/// 413 with the usual `{"detail": ...}` shape. JSON bodies pass through.
async fn json_error_body(response: Response) -> Response {
    let detail = match response.status() {
        StatusCode::NOT_FOUND => detail::NOT_FOUND,
        StatusCode::METHOD_NOT_ALLOWED => detail::METHOD_NOT_ALLOWED,
        StatusCode::PAYLOAD_TOO_LARGE => detail::PAYLOAD_TOO_LARGE,
        _ => return response,
    };

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if is_json {
        return response;
    }

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.remove(header::CONTENT_TYPE);
    let body = ErrorResponse {
        detail: detail.to_string(),
    };
    (parts, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn bare_method_not_allowed_gets_a_detail_body() {
        let response = Response::builder()
            .status(StatusCode::METHOD_NOT_ALLOWED)
            .header(header::ALLOW, "GET,HEAD")
            .body(Body::empty())
            .unwrap();

        let response = json_error_body(response).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET,HEAD");
        assert_eq!(
            body_of(response).await,
            serde_json::json!({"detail": "Method not allowed"})
        );
    }

    #[tokio::test]
    async fn json_not_found_is_left_alone() {
        let response = AppError::NotFound(detail::SECRET_NOT_FOUND).into_response();

        let response = json_error_body(response).await;
        assert_eq!(
            body_of(response).await,
            serde_json::json!({"detail": "Secret not found"})
        );
    }
}
