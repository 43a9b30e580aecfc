use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::services::auth::token::extract_token;
use crate::services::credentials::token_fingerprint;
use crate::state::AppState;

pub(super) async fn token_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if !state.paths.is_protected(req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let started = Instant::now();
    let now = chrono::Utc::now().timestamp();
    let force_fresh = wants_fresh(req.headers());

    let ctx = match state.tokens.verify(req.headers(), force_fresh, now).await {
        Ok(ctx) => ctx,
        Err(err) => {
            tracing::warn!(
                path = %req.uri().path(),
                token = ?extract_token(req.headers()).ok().map(token_fingerprint),
                error = %err,
                "token verification failed"
            );
            return Err(err.into());
        }
    };

    tracing::debug!(
        user = ?ctx.user_uuid(),
        force_fresh,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "token stage passed"
    );

    // middleware → licence stage / extractor への受け渡し
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}

/// `Cache-Control: no-cache` asks for a fresh introspection (honoured at most
/// once per `FORCED_REFRESH_INTERVAL_SECONDS` for a given token).
fn wants_fresh(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::CACHE_CONTROL)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|directive| directive.trim().eq_ignore_ascii_case("no-cache"))
}
