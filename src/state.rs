/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - path policy, token/licence verifiers, secret store
 * - Clone 前提で持つ (内部は Arc で clone cheap)
 */
use std::sync::Arc;

use crate::services::auth::{LicenceVerifier, PathPolicy, TokenVerifier};
use crate::services::vault::SecretStore;

#[derive(Clone, Debug)]
pub struct AppState {
    pub paths: Arc<PathPolicy>,
    pub tokens: Arc<TokenVerifier>,
    pub licences: Arc<LicenceVerifier>,
    pub secrets: Arc<SecretStore>,
}

impl AppState {
    pub fn new(
        paths: PathPolicy,
        tokens: TokenVerifier,
        licences: LicenceVerifier,
        secrets: SecretStore,
    ) -> Self {
        Self {
            paths: Arc::new(paths),
            tokens: Arc::new(tokens),
            licences: Arc::new(licences),
            secrets: Arc::new(secrets),
        }
    }
}
