use std::time::Instant;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

use crate::error::{AppError, detail};
use crate::services::auth::RequestCtx;
use crate::services::credentials::token_fingerprint;
use crate::state::AppState;

pub(super) async fn licence_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if !state.paths.requires_licence(req.uri().path()) {
        return Ok(next.run(req).await);
    }

    // token stage が先に走っている前提。無ければ配線ミス
    let Some(mut ctx) = req.extensions_mut().remove::<RequestCtx>() else {
        tracing::error!(path = %req.uri().path(), "licence stage reached without a token context");
        return Err(AppError::Unauthenticated(detail::MISSING_TOKEN));
    };

    let started = Instant::now();
    let now = chrono::Utc::now().timestamp();

    if let Err(err) = state.licences.verify(req.headers(), &mut ctx, now).await {
        tracing::warn!(
            path = %req.uri().path(),
            token = %token_fingerprint(&ctx.raw_token),
            user = ?ctx.user_uuid(),
            error = %err,
            "licence verification failed"
        );
        return Err(err.into());
    }

    tracing::debug!(
        license = ?ctx.license_uuid,
        entity = ?ctx.entity_uuid,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "licence stage passed"
    );

    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}
