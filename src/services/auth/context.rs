use crate::services::identity::{Identity, IntrospectionRecord};
use crate::services::licenses::{License, model};

/// Per-request authorization scratchpad.
///
/// Created by the token stage, completed by the licence stage, carried in the
/// request extensions and dropped with the request.
#[derive(Debug, Clone)]
pub struct RequestCtx {
    pub raw_token: String,
    pub token_info: IntrospectionRecord,
    pub identity: Identity,
    pub licenses: Vec<License>,
    pub license_uuid: Option<String>,
    pub entity_uuid: Option<String>,
}

impl RequestCtx {
    pub fn new(raw_token: impl Into<String>, token_info: IntrospectionRecord, licenses: Vec<License>) -> Self {
        let identity = Identity::from(&token_info);
        Self {
            raw_token: raw_token.into(),
            token_info,
            identity,
            licenses,
            license_uuid: None,
            entity_uuid: None,
        }
    }

    pub fn user_uuid(&self) -> Option<&str> {
        self.identity.user_uuid.as_deref()
    }

    pub fn license(&self, uuid: &str) -> Option<&License> {
        model::find(&self.licenses, uuid)
    }
}
