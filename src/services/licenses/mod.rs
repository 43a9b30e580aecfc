pub mod model;
pub mod registry;

pub use model::{License, RawLicenseCandidate, filter_current};
pub use registry::{HttpLicenseRegistry, LicenseRegistry};
