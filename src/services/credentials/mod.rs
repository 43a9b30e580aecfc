pub mod entry;
pub mod store;

pub use entry::CachedCredential;
pub use store::{CredentialCache, token_fingerprint};
