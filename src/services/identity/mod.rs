pub mod provider;
pub mod record;

pub use provider::{IdentityProvider, KeycloakIntrospector};
pub use record::{Identity, IntrospectionRecord};
