/*
 * Responsibility
 * - Untrusted licence data (RawLicenseCandidate) → validated License
 * - "current" filtering (iat < now < exp)
 *
 * Notes
 * - Malformed entries are dropped with a warning, never turned into errors.
 */
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One licence entry exactly as received (from the registry or from the cache).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawLicenseCandidate(pub Value);

/// A well-formed licence grant.
///
/// Role/app collections are opaque to the gateway and passed through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub uuid: String,
    #[serde(default)]
    pub type_uuid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub iat: i64,
    pub exp: i64,
    #[serde(default)]
    pub entity_uuid: Option<String>,
    #[serde(default)]
    pub api_roles: Value,
    #[serde(default)]
    pub app_roles: Value,
    #[serde(default)]
    pub apps: Value,
}

impl License {
    pub fn is_current(&self, now: i64) -> bool {
        self.iat < now && now < self.exp
    }
}

impl RawLicenseCandidate {
    /// Parse into a `License`. Only JSON objects are accepted (serde would
    /// otherwise read an array positionally into the struct).
    pub fn parse(&self) -> Option<License> {
        if !self.0.is_object() {
            return None;
        }
        License::deserialize(&self.0).ok()
    }
}

impl From<&License> for RawLicenseCandidate {
    fn from(license: &License) -> Self {
        // Serializing a struct of strings, integers and Values cannot fail.
        RawLicenseCandidate(serde_json::to_value(license).unwrap_or(Value::Null))
    }
}

/// Keep only well-formed licences valid at `now`, projected to `License`.
pub fn filter_current(candidates: &[RawLicenseCandidate], now: i64) -> Vec<License> {
    candidates
        .iter()
        .filter_map(|candidate| match candidate.parse() {
            Some(license) => Some(license),
            None => {
                tracing::warn!(kind = value_kind(&candidate.0), "skipping malformed licence entry");
                None
            }
        })
        .filter(|license| license.is_current(now))
        .collect()
}

pub fn find<'a>(licenses: &'a [License], uuid: &str) -> Option<&'a License> {
    licenses.iter().find(|license| license.uuid == uuid)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
