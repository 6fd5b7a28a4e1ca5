//! DreamForge Remote: HTTP adapters for the external collaborators.
//!
//! - [`StabilityClient`]: the text-to-image provider
//!   ([`ImageGenerator`](dreamforge_core::gateway::ImageGenerator))
//! - [`SupabaseClient`]: session lookup, subscription check and checkout
//!   functions ([`SubscriptionAuthority`](dreamforge_core::gateway::SubscriptionAuthority),
//!   [`CheckoutProvider`](dreamforge_core::gateway::CheckoutProvider))

pub mod config;
pub mod error;
pub mod stability;
pub mod supabase;

pub use config::{StabilityConfig, SupabaseConfig};
pub use error::RemoteError;
pub use stability::StabilityClient;
pub use supabase::SupabaseClient;
