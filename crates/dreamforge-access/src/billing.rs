//! Plan catalogue and checkout redirects.

use dreamforge_core::error::{DreamforgeError, DreamforgeResult};
use dreamforge_core::gateway::{CheckoutProvider, SubscriptionAuthority};
use dreamforge_core::models::entitlement::{EntitlementSet, entitlements_for};
use dreamforge_core::models::session::Session;
use dreamforge_core::models::tier::SubscriptionTier;
use tracing::info;

use crate::config::AccessConfig;
use crate::error::AccessError;

/// A plan as presented on the pricing page.
#[derive(Debug, Clone, Copy)]
pub struct PlanOffer {
    pub tier: SubscriptionTier,
    pub monthly_price_cents: u32,
    pub entitlements: &'static EntitlementSet,
}

pub fn plan_catalogue() -> Vec<PlanOffer> {
    SubscriptionTier::ALL
        .into_iter()
        .map(|tier| PlanOffer {
            tier,
            monthly_price_cents: tier.monthly_price_cents(),
            entitlements: entitlements_for(tier),
        })
        .collect()
}

/// Checkout and customer-portal orchestration.
///
/// Returns redirect URLs only; callers refresh the subscription state
/// once the user comes back from the payment provider.
pub struct BillingService<P: CheckoutProvider, A: SubscriptionAuthority> {
    payments: P,
    authority: A,
    config: AccessConfig,
}

impl<P: CheckoutProvider, A: SubscriptionAuthority> BillingService<P, A> {
    pub fn new(payments: P, authority: A, config: AccessConfig) -> Self {
        Self {
            payments,
            authority,
            config,
        }
    }

    /// Checkout URL for upgrading to `tier`.
    pub async fn start_checkout(&self, tier: SubscriptionTier) -> DreamforgeResult<String> {
        let price_id = match tier {
            SubscriptionTier::Community => return Err(AccessError::NotPurchasable(tier).into()),
            SubscriptionTier::Pro => &self.config.pro_price_id,
            SubscriptionTier::Studio => &self.config.studio_price_id,
        };
        if price_id.is_empty() {
            return Err(DreamforgeError::Internal(format!(
                "no price configured for the {tier} plan"
            )));
        }

        let session = self.session().await?;
        let url = self
            .payments
            .checkout_url(&session.access_token, price_id)
            .await?;
        info!(user_id = %session.user_id, %tier, "Checkout session created");
        Ok(url)
    }

    /// URL of the payment provider's subscription management page.
    pub async fn manage_subscription(&self) -> DreamforgeResult<String> {
        let session = self.session().await?;
        self.payments
            .customer_portal_url(&session.access_token)
            .await
    }

    async fn session(&self) -> DreamforgeResult<Session> {
        self.authority
            .get_session()
            .await?
            .ok_or_else(|| AccessError::NoSession.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_lists_every_tier_in_price_order() {
        let plans = plan_catalogue();
        assert_eq!(plans.len(), 3);
        assert_eq!(plans[0].monthly_price_cents, 0);
        assert_eq!(plans[1].tier, SubscriptionTier::Pro);
        assert_eq!(plans[1].monthly_price_cents, 999);
        assert_eq!(plans[2].monthly_price_cents, 1999);
        assert_eq!(plans[2].entitlements.tier, SubscriptionTier::Studio);
    }
}
