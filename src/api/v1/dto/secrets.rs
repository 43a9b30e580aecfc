/*
 * Responsibility
 * - secret 系の request/response DTO
 * - validate() で形式チェック (store に渡す前)
 */
use serde::{Deserialize, Serialize};

use crate::services::vault::SecretData;

/// Flat `{"key": "value", ...}` body; nested values are rejected by serde.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct SecretRequest(pub SecretData);

impl SecretRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.0.keys().any(|k| k.trim().is_empty()) {
            return Err("secret keys must not be empty");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<SecretData>,
}

impl MessageResponse {
    pub const RECORDED: &'static str = "Secret recorded successfully";
    pub const CREATED: &'static str = "Secret created successfully";
    pub const ALREADY_EXISTS: &'static str = "Secret already exists";

    pub fn new(message: &'static str) -> Self {
        Self {
            message,
            data: None,
        }
    }

    pub fn with_data(message: &'static str, data: SecretData) -> Self {
        Self {
            message,
            data: Some(data),
        }
    }
}
