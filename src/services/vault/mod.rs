pub mod client;
pub mod secrets;

pub use client::{SecretData, SecretVault, VaultKvClient};
pub use secrets::{CreateOutcome, SecretError, SecretPath, SecretStore};
