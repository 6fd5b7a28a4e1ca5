//! Feature gate: The single "may the user do X right now" query.
//!
//! The gate holds no state of its own: every answer is read from the
//! entitlement table for the tier currently published by
//! [`SubscriptionState`](crate::subscription::SubscriptionState).
//! User-facing feedback for a denial is built separately by [`denial`].

use dreamforge_core::models::entitlement::{
    Capability, EntitlementSet, ExportFormat, Resolution, entitlements_for, tiers_with,
};
use dreamforge_core::models::subscription::Subscription;
use dreamforge_core::models::tier::SubscriptionTier;
use tokio::sync::watch;

use crate::error::AccessError;

/// Curated prompts offered to plans with [`Capability::PromptSuggestions`].
pub const PROMPT_SUGGESTIONS: &[&str] = &[
    "A majestic dragon soaring through storm clouds",
    "Cyberpunk city at night with neon lights",
    "Peaceful landscape with mountains and lakes",
    "Abstract art with vibrant colors and geometric shapes",
    "Fantasy castle on a floating island",
];

#[derive(Debug, Clone)]
pub struct FeatureGate {
    subscription: watch::Receiver<Subscription>,
}

impl FeatureGate {
    pub fn new(subscription: watch::Receiver<Subscription>) -> Self {
        Self { subscription }
    }

    /// A gate pinned to one tier.
    pub fn fixed(tier: SubscriptionTier) -> Self {
        let (_tx, rx) = watch::channel(Subscription::new(tier, None));
        Self::new(rx)
    }

    pub fn tier(&self) -> SubscriptionTier {
        self.subscription.borrow().tier
    }

    pub fn entitlements(&self) -> &'static EntitlementSet {
        entitlements_for(self.tier())
    }

    pub fn can_use(&self, capability: Capability) -> bool {
        self.entitlements().has(capability)
    }

    pub fn require(&self, capability: Capability) -> Result<(), AccessError> {
        let entitlements = self.entitlements();
        if entitlements.has(capability) {
            Ok(())
        } else {
            Err(AccessError::CapabilityDenied {
                capability,
                tier: entitlements.tier,
            })
        }
    }

    pub fn allows_resolution(&self, resolution: Resolution) -> bool {
        self.entitlements().allows_resolution(resolution)
    }

    pub fn require_resolution(&self, resolution: Resolution) -> Result<(), AccessError> {
        let entitlements = self.entitlements();
        if entitlements.allows_resolution(resolution) {
            Ok(())
        } else {
            Err(AccessError::ResolutionNotEntitled {
                requested: resolution,
                max: entitlements.max_resolution,
                tier: entitlements.tier,
            })
        }
    }

    pub fn allows_export(&self, format: ExportFormat) -> bool {
        self.entitlements().allows_export(format)
    }

    pub fn prompt_suggestions(&self) -> Result<&'static [&'static str], AccessError> {
        self.require(Capability::PromptSuggestions)?;
        Ok(PROMPT_SUGGESTIONS)
    }
}

/// User-facing explanation of a denied capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub title: &'static str,
    pub description: String,
}

/// Build the uniform upgrade notice for `capability`.
pub fn denial(capability: Capability) -> Denial {
    let plans: Vec<&str> = tiers_with(capability)
        .into_iter()
        .filter(SubscriptionTier::is_paid)
        .map(|tier| tier.as_str())
        .collect();

    let description = match plans.as_slice() {
        [] => "This feature is not available on any plan.".to_string(),
        [plan] => format!("This feature is available in the {plan} plan."),
        [init @ .., last] => format!(
            "This feature is available in the {} and {last} plans.",
            init.join(", ")
        ),
    };

    Denial {
        title: "Upgrade Required",
        description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_gate_answers_from_table() {
        let community = FeatureGate::fixed(SubscriptionTier::Community);
        assert!(community.can_use(Capability::GalleryAccess));
        assert!(!community.can_use(Capability::AiAssistant));

        let studio = FeatureGate::fixed(SubscriptionTier::Studio);
        assert!(studio.can_use(Capability::ApiAccess));
        assert!(studio.allows_export(ExportFormat::Psd));
    }

    #[test]
    fn gate_follows_published_tier() {
        let (tx, rx) = watch::channel(Subscription::community());
        let gate = FeatureGate::new(rx);
        assert!(!gate.can_use(Capability::LivePreview));

        tx.send_replace(Subscription::new(SubscriptionTier::Pro, None));
        assert!(gate.can_use(Capability::LivePreview));
        assert!(!gate.can_use(Capability::Inpainting));
    }

    #[test]
    fn require_reports_tier() {
        let gate = FeatureGate::fixed(SubscriptionTier::Pro);
        let err = gate.require(Capability::ControlNet).unwrap_err();
        assert!(matches!(
            err,
            AccessError::CapabilityDenied {
                capability: Capability::ControlNet,
                tier: SubscriptionTier::Pro
            }
        ));
    }

    #[test]
    fn resolution_requirement() {
        let gate = FeatureGate::fixed(SubscriptionTier::Community);
        assert!(gate.require_resolution(Resolution::Square512).is_ok());
        assert!(matches!(
            gate.require_resolution(Resolution::Uhd4K),
            Err(AccessError::ResolutionNotEntitled {
                max: Resolution::Square512,
                ..
            })
        ));
    }

    #[test]
    fn suggestions_are_gated() {
        assert!(
            FeatureGate::fixed(SubscriptionTier::Community)
                .prompt_suggestions()
                .is_err()
        );
        assert_eq!(
            FeatureGate::fixed(SubscriptionTier::Pro)
                .prompt_suggestions()
                .unwrap()
                .len(),
            5
        );
    }

    #[test]
    fn denial_lists_unlocking_plans() {
        let notice = denial(Capability::PromptSuggestions);
        assert_eq!(notice.title, "Upgrade Required");
        assert_eq!(
            notice.description,
            "This feature is available in the Pro and Studio plans."
        );

        assert_eq!(
            denial(Capability::Webhooks).description,
            "This feature is available in the Studio plan."
        );
    }
}
