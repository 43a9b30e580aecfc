use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Token introspection result as returned by the identity provider.
///
/// NOTE:
/// - `aud` can be a string or an array of strings; anything else (including a
///   missing claim, which ends up as `Null`) never matches an audience.
/// - Claims we do not model are kept in `extra` so a cached entry can be written
///   back without losing them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntrospectionRecord {
    #[serde(default)]
    pub active: bool,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub aud: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    // Stamped when the record is written to the credential cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_time: Option<i64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IntrospectionRecord {
    pub fn has_audience(&self, expected: &str) -> bool {
        match &self.aud {
            Value::String(aud) => aud == expected,
            Value::Array(auds) => auds.iter().any(|aud| aud.as_str() == Some(expected)),
            _ => false,
        }
    }

    /// `iat < now < exp`; a record missing either bound is never within its window.
    pub fn is_within_window(&self, now: i64) -> bool {
        match (self.iat, self.exp) {
            (Some(iat), Some(exp)) => iat < now && now < exp,
            _ => false,
        }
    }
}

/// Compact identity projection published for handlers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub user_uuid: Option<String>,
    pub user_display_name: Option<String>,
    pub user_email: Option<String>,
    pub user_audiences: Value,
    pub cached_time: Option<i64>,
}

impl From<&IntrospectionRecord> for Identity {
    fn from(record: &IntrospectionRecord) -> Self {
        Self {
            user_uuid: record.sub.clone(),
            user_display_name: record.preferred_username.clone(),
            user_email: record.email.clone(),
            user_audiences: record.aud.clone(),
            cached_time: record.cached_time,
        }
    }
}
