/*
 * Responsibility
 * - request authentication pipeline (token stage → licence stage)
 * - path classification deciding which stages apply
 */
pub mod context;
pub mod error;
pub mod licence;
pub mod paths;
pub mod token;

pub use context::RequestCtx;
pub use error::AuthError;
pub use licence::{LICENCE_HEADER, LicenceVerifier};
pub use paths::PathPolicy;
pub use token::TokenVerifier;
