//! Subscription snapshot domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tier::SubscriptionTier;

/// The user's plan as last reported by the subscription authority.
///
/// Tier and renewal date always travel together; there is no way to
/// update one without the other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub tier: SubscriptionTier,
    /// `None` means no recurring billing.
    pub renews_at: Option<DateTime<Utc>>,
}

impl Subscription {
    pub fn new(tier: SubscriptionTier, renews_at: Option<DateTime<Utc>>) -> Self {
        Self { tier, renews_at }
    }

    /// The fail-closed default: Community, no renewal.
    pub fn community() -> Self {
        Self::default()
    }
}

/// Raw response of the subscription authority's status check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionStatus {
    pub subscribed: bool,
    pub tier: Option<String>,
    /// RFC 3339 timestamp.
    pub renewal_date: Option<String>,
}
