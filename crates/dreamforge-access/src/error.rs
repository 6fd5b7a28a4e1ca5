//! Access-layer error types.

use dreamforge_core::error::DreamforgeError;
use dreamforge_core::models::entitlement::{Capability, Resolution};
use dreamforge_core::models::tier::SubscriptionTier;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("prompt must not be empty")]
    EmptyPrompt,

    #[error("prompt exceeds {max} characters")]
    PromptTooLong { max: usize },

    #[error("sample count {requested} outside {min}..={max}")]
    SampleCount { requested: u32, min: u32, max: u32 },

    #[error("guidance scale {requested} outside {min}..={max}")]
    GuidanceScale { requested: f32, min: f32, max: f32 },

    #[error("{requested} exceeds the {tier} plan maximum of {max}")]
    ResolutionNotEntitled {
        requested: Resolution,
        max: Resolution,
        tier: SubscriptionTier,
    },

    #[error("{capability} is not included in the {tier} plan")]
    CapabilityDenied {
        capability: Capability,
        tier: SubscriptionTier,
    },

    #[error("{required} credits required, {available} available")]
    InsufficientCredits { required: u32, available: u32 },

    #[error("no active session")]
    NoSession,

    #[error("the {0} plan cannot be purchased")]
    NotPurchasable(SubscriptionTier),

    #[error("creation belongs to another user")]
    NotOwner,
}

impl From<AccessError> for DreamforgeError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::EmptyPrompt
            | AccessError::PromptTooLong { .. }
            | AccessError::SampleCount { .. }
            | AccessError::GuidanceScale { .. }
            | AccessError::NotPurchasable(_) => DreamforgeError::Validation {
                message: err.to_string(),
            },
            AccessError::ResolutionNotEntitled { requested, .. } => {
                DreamforgeError::FeatureDenied {
                    feature: format!("resolution {requested}"),
                    reason: err.to_string(),
                }
            }
            AccessError::CapabilityDenied { capability, .. } => DreamforgeError::FeatureDenied {
                feature: capability.to_string(),
                reason: err.to_string(),
            },
            AccessError::InsufficientCredits {
                required,
                available,
            } => DreamforgeError::InsufficientCredits {
                required,
                available,
            },
            AccessError::NoSession => DreamforgeError::AuthenticationRequired,
            AccessError::NotOwner => DreamforgeError::FeatureDenied {
                feature: "creation".into(),
                reason: err.to_string(),
            },
        }
    }
}
