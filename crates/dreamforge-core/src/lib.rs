//! DreamForge Core: Domain models, the entitlement table, and the
//! contracts of the external collaborators.

pub mod error;
pub mod gateway;
pub mod models;
pub mod repository;

pub use error::{DreamforgeError, DreamforgeResult, ErrorKind, ExternalService};
pub use models::entitlement::{
    Capability, EntitlementSet, ExportFormat, GenerationLimit, Resolution, entitlements_for,
};
pub use models::tier::SubscriptionTier;
