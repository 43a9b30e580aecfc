/*
 * Responsibility
 * - (entity, licence, service) → deterministic vault path
 * - read / upsert / create-if-absent on top of SecretVault
 */
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::error::{AppError, detail};
use crate::services::upstream::UpstreamError;
use crate::services::vault::client::{SecretData, SecretVault};

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret not found")]
    NotFound,
    #[error("invalid {0} path segment")]
    InvalidSegment(&'static str),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl From<SecretError> for AppError {
    fn from(e: SecretError) -> Self {
        match e {
            SecretError::NotFound => AppError::NotFound(detail::SECRET_NOT_FOUND),
            SecretError::InvalidSegment(what) => {
                AppError::BadRequest(format!("invalid {what} path segment"))
            }
            SecretError::Upstream(err) => {
                tracing::error!(error = %err, "secret vault call failed");
                AppError::UpstreamUnavailable(detail::SECRET_STORE_UNAVAILABLE)
            }
        }
    }
}

/// `entities/<entity_uuid>/licenses/<license_uuid>/<service_name>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretPath(String);

impl SecretPath {
    pub fn new(entity_uuid: &str, license_uuid: &str, service: &str) -> Result<Self, SecretError> {
        let entity = segment(entity_uuid, "entity")?;
        let license = segment(license_uuid, "licence")?;
        let service = segment(service, "service")?;
        Ok(Self(format!("entities/{entity}/licenses/{license}/{service}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecretPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// One path segment, never able to climb or split the tree.
fn segment<'a>(value: &'a str, what: &'static str) -> Result<&'a str, SecretError> {
    if value.is_empty() || value == "." || value == ".." || value.contains('/') {
        return Err(SecretError::InvalidSegment(what));
    }
    Ok(value)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    // Existing secret left untouched
    AlreadyExists(SecretData),
}

#[derive(Clone)]
pub struct SecretStore {
    vault: Arc<dyn SecretVault>,
}

impl fmt::Debug for SecretStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretStore").finish_non_exhaustive()
    }
}

impl SecretStore {
    pub fn new(vault: Arc<dyn SecretVault>) -> Self {
        Self { vault }
    }

    pub async fn get_secret(
        &self,
        entity_uuid: &str,
        license_uuid: &str,
        service: &str,
    ) -> Result<SecretData, SecretError> {
        let path = SecretPath::new(entity_uuid, license_uuid, service)?;
        tracing::info!(%path, "reading secret");

        self.vault
            .read(path.as_str())
            .await?
            .ok_or(SecretError::NotFound)
    }

    /// Write-wins upsert; rewriting identical data just adds a version.
    pub async fn create_secret(
        &self,
        entity_uuid: &str,
        license_uuid: &str,
        service: &str,
        data: &SecretData,
    ) -> Result<(), SecretError> {
        let path = SecretPath::new(entity_uuid, license_uuid, service)?;
        tracing::info!(%path, keys = data.len(), "recording secret");

        self.vault.write(path.as_str(), data).await?;
        Ok(())
    }

    /// Write only when nothing is stored at the path yet.
    ///
    /// Check-then-write is not atomic: two concurrent first writers can both
    /// observe an empty path, and the later write wins.
    pub async fn create_if_absent(
        &self,
        entity_uuid: &str,
        license_uuid: &str,
        service: &str,
        data: &SecretData,
    ) -> Result<CreateOutcome, SecretError> {
        let path = SecretPath::new(entity_uuid, license_uuid, service)?;

        if let Some(existing) = self.vault.read(path.as_str()).await? {
            tracing::info!(%path, "secret already exists, not overwritten");
            return Ok(CreateOutcome::AlreadyExists(existing));
        }

        tracing::info!(%path, keys = data.len(), "creating secret");
        self.vault.write(path.as_str(), data).await?;
        Ok(CreateOutcome::Created)
    }
}
