/*
 * Responsibility
 * - /credential/v1 系 handler
 * - LicenceScope (middleware 済み) + Path/Json を受け、SecretStore を呼ぶ
 */
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{
    api::v1::{
        dto::secrets::{MessageResponse, SecretRequest},
        extractors::LicenceScope,
    },
    error::AppError,
    services::vault::{CreateOutcome, SecretData},
    state::AppState,
};

fn secret_body(body: Result<Json<SecretRequest>, JsonRejection>) -> Result<SecretData, AppError> {
    let Json(req) = body.map_err(|rejection| match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge,
        _ => AppError::BadRequest(rejection.body_text()),
    })?;
    req.validate()
        .map_err(|msg| AppError::BadRequest(msg.to_string()))?;
    Ok(req.0)
}

/// GET /credential/v1/{service}
pub async fn get_secret(
    State(state): State<AppState>,
    scope: LicenceScope,
    Path(service): Path<String>,
) -> Result<Json<SecretData>, AppError> {
    let data = state
        .secrets
        .get_secret(&scope.entity_uuid, &scope.license_uuid, &service)
        .await?;

    Ok(Json(data))
}

/// POST /credential/v1/{license_uuid}/{service}
///
/// Writes under the entity owning the licence named in the path, which must be
/// one of the caller's current licences.
pub async fn record_secret(
    State(state): State<AppState>,
    scope: LicenceScope,
    Path((license_uuid, service)): Path<(String, String)>,
    body: Result<Json<SecretRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let entity_uuid = scope.entity_of(&license_uuid)?;
    let data = secret_body(body)?;

    state
        .secrets
        .create_secret(entity_uuid, &license_uuid, &service, &data)
        .await?;

    Ok(Json(MessageResponse::new(MessageResponse::RECORDED)))
}

/// POST /credential/v1/{service}
pub async fn create_secret_if_absent(
    State(state): State<AppState>,
    scope: LicenceScope,
    Path(service): Path<String>,
    body: Result<Json<SecretRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let data = secret_body(body)?;

    let outcome = state
        .secrets
        .create_if_absent(&scope.entity_uuid, &scope.license_uuid, &service, &data)
        .await?;

    Ok(match outcome {
        CreateOutcome::Created => (
            StatusCode::CREATED,
            Json(MessageResponse::new(MessageResponse::CREATED)),
        ),
        CreateOutcome::AlreadyExists(existing) => (
            StatusCode::OK,
            Json(MessageResponse::with_data(
                MessageResponse::ALREADY_EXISTS,
                existing,
            )),
        ),
    })
}
