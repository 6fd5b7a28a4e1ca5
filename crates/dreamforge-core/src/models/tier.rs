//! Subscription tier domain model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DreamforgeError;

/// A named subscription level. `Community` is the unpaid default.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum SubscriptionTier {
    #[default]
    Community,
    Pro,
    Studio,
}

impl SubscriptionTier {
    /// Every tier, cheapest first.
    pub const ALL: [SubscriptionTier; 3] = [
        SubscriptionTier::Community,
        SubscriptionTier::Pro,
        SubscriptionTier::Studio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Community => "Community",
            SubscriptionTier::Pro => "Pro",
            SubscriptionTier::Studio => "Studio",
        }
    }

    /// Monthly list price in US cents.
    pub fn monthly_price_cents(&self) -> u32 {
        match self {
            SubscriptionTier::Community => 0,
            SubscriptionTier::Pro => 999,
            SubscriptionTier::Studio => 1999,
        }
    }

    pub fn is_paid(&self) -> bool {
        !matches!(self, SubscriptionTier::Community)
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionTier {
    type Err = DreamforgeError;

    /// Case-insensitive. Unknown names are an error, never a silent default.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "community" | "free" => Ok(SubscriptionTier::Community),
            "pro" => Ok(SubscriptionTier::Pro),
            "studio" => Ok(SubscriptionTier::Studio),
            other => Err(DreamforgeError::validation(format!(
                "unknown subscription tier '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_authority_names() {
        assert_eq!("Pro".parse::<SubscriptionTier>().unwrap(), SubscriptionTier::Pro);
        assert_eq!(
            " studio ".parse::<SubscriptionTier>().unwrap(),
            SubscriptionTier::Studio
        );
        assert_eq!(
            "Community".parse::<SubscriptionTier>().unwrap(),
            SubscriptionTier::Community
        );
    }

    #[test]
    fn unknown_tier_is_rejected() {
        assert!("Enterprise".parse::<SubscriptionTier>().is_err());
        assert!("".parse::<SubscriptionTier>().is_err());
    }

    #[test]
    fn tiers_are_ordered_by_price() {
        for pair in SubscriptionTier::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].monthly_price_cents() < pair[1].monthly_price_cents());
        }
    }
}
