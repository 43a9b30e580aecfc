use serde::{Deserialize, Serialize};

use crate::services::identity::IntrospectionRecord;
use crate::services::licenses::{License, RawLicenseCandidate};

/// What the credential cache stores under a token: the introspection claims with
/// the caller's licences attached.
///
/// The licences are kept raw here and re-parsed on every read, so an entry
/// written by an older build (or by hand) can never smuggle a malformed licence
/// past `filter_current`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedCredential {
    #[serde(flatten)]
    pub token_info: IntrospectionRecord,
    #[serde(default)]
    pub licenses: Vec<RawLicenseCandidate>,
}

impl CachedCredential {
    pub fn new(token_info: IntrospectionRecord) -> Self {
        Self {
            token_info,
            licenses: Vec::new(),
        }
    }

    pub fn with_licenses(mut self, licenses: &[License]) -> Self {
        self.licenses = licenses.iter().map(RawLicenseCandidate::from).collect();
        self
    }
}
