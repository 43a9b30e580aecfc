use async_trait::async_trait;
use std::time::Duration;

use crate::services::identity::record::IntrospectionRecord;
use crate::services::upstream::{UpstreamError, http_client, join_url};

/// Resolves an opaque bearer token into introspection data.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    async fn introspect(&self, token: &str) -> Result<IntrospectionRecord, UpstreamError>;
}

/// Keycloak token introspection (RFC 7662) with static client credentials.
#[derive(Clone)]
pub struct KeycloakIntrospector {
    endpoint: url::Url,
    client_id: String,
    client_secret: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for KeycloakIntrospector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print the client secret
        f.debug_struct("KeycloakIntrospector")
            .field("endpoint", &self.endpoint.as_str())
            .field("client_id", &self.client_id)
            .finish()
    }
}

impl KeycloakIntrospector {
    pub fn new(
        host: &str,
        realm: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let endpoint = join_url(
            host,
            &[
                "realms",
                realm,
                "protocol",
                "openid-connect",
                "token",
                "introspect",
            ],
        )?;

        Ok(Self {
            endpoint,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            http: http_client(timeout)?,
        })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }
}

#[async_trait]
impl IdentityProvider for KeycloakIntrospector {
    async fn introspect(&self, token: &str) -> Result<IntrospectionRecord, UpstreamError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .form(&[
                ("token", token),
                ("token_type_hint", "access_token"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UpstreamError::Status(response.status().as_u16()));
        }

        Ok(response.json::<IntrospectionRecord>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_follows_keycloak_layout() {
        let idp = KeycloakIntrospector::new(
            "https://sso.example.com/",
            "karned",
            "api-credential",
            "s3cret",
            Duration::from_secs(5),
        )
        .unwrap();

        assert_eq!(
            idp.endpoint(),
            "https://sso.example.com/realms/karned/protocol/openid-connect/token/introspect"
        );
    }

    #[test]
    fn debug_hides_client_secret() {
        let idp = KeycloakIntrospector::new(
            "https://sso.example.com",
            "karned",
            "api-credential",
            "s3cret",
            Duration::from_secs(5),
        )
        .unwrap();

        assert!(!format!("{idp:?}").contains("s3cret"));
    }
}
