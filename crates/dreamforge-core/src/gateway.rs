//! External collaborator contracts.
//!
//! Implementations live in `dreamforge-remote`; the access layer only
//! sees these traits.

use crate::error::DreamforgeResult;
use crate::models::generation::{GeneratedImage, ProviderRequest};
use crate::models::session::Session;
use crate::models::subscription::SubscriptionStatus;

/// Backend auth and subscription lookup. Calls must be idempotent.
pub trait SubscriptionAuthority: Send + Sync {
    /// The current session, or `None` when signed out.
    fn get_session(&self) -> impl Future<Output = DreamforgeResult<Option<Session>>> + Send;
    fn get_subscription_status(
        &self,
        access_token: &str,
    ) -> impl Future<Output = DreamforgeResult<SubscriptionStatus>> + Send;
}

/// Text-to-image provider.
pub trait ImageGenerator: Send + Sync {
    fn generate(
        &self,
        request: ProviderRequest,
    ) -> impl Future<Output = DreamforgeResult<Vec<GeneratedImage>>> + Send;
}

/// Payment provider: produces redirect URLs only.
pub trait CheckoutProvider: Send + Sync {
    fn checkout_url(
        &self,
        access_token: &str,
        price_id: &str,
    ) -> impl Future<Output = DreamforgeResult<String>> + Send;
    fn customer_portal_url(
        &self,
        access_token: &str,
    ) -> impl Future<Output = DreamforgeResult<String>> + Send;
}
