/*
 * Responsibility
 * - URL 構造を定義 (/health, /credential/v1/...)
 * - 認証の適用範囲はここではなく PathPolicy (app 側) で決める
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::v1::handlers::{
    health::health,
    secrets::{create_secret_if_absent, get_secret, record_secret},
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route(
            "/credential/v1/{service}",
            get(get_secret).post(create_secret_if_absent),
        )
        .route("/credential/v1/{license_uuid}/{service}", post(record_secret))
}
