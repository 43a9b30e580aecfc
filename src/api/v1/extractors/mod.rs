pub mod licence_scope;

pub use licence_scope::LicenceScope;
