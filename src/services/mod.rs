pub mod auth;
pub mod cache;
pub mod credentials;
pub mod identity;
pub mod licenses;
pub mod upstream;
pub mod vault;
