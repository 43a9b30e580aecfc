//! Authentication pipeline as axum middleware.
//!
//! Both stages are thin adapters over `services::auth`; they only decide whether
//! a stage applies to the request path and move the `RequestCtx` through the
//! request extensions.

use axum::{Router, middleware};

use crate::state::AppState;

mod licence;
mod token;

/// Wrap `router` with the token stage (outer) and the licence stage (inner).
///
/// Apply to the whole router before `with_state`, so that path classification
/// sees the full request path.
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router
        .layer(middleware::from_fn_with_state(
            state.clone(),
            licence::licence_middleware,
        ))
        .layer(middleware::from_fn_with_state(state, token::token_middleware))
}
