//! Access-layer configuration.

use dreamforge_core::models::entitlement::Resolution;
use serde::{Deserialize, Serialize};

/// When a finite credit balance refills to the tier's limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetPeriod {
    /// At the first ledger operation after a UTC calendar-day boundary.
    #[default]
    Daily,
    /// Only on tier change or an explicit reset.
    Manual,
}

/// Credit price of a generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditCost {
    /// Credits per image at or below `base_pixels` (default: 1).
    pub credits_per_image: u32,
    /// Pixel area covered by one unit of cost (default: 512×512).
    pub base_pixels: u64,
}

impl Default for CreditCost {
    fn default() -> Self {
        Self {
            credits_per_image: 1,
            base_pixels: 512 * 512,
        }
    }
}

impl CreditCost {
    /// Credits required for `samples` images at `resolution`.
    ///
    /// Each image costs `credits_per_image` for every started
    /// `base_pixels` of area, with a minimum of one unit.
    pub fn credits_for(&self, resolution: Resolution, samples: u32) -> u32 {
        let units = resolution.pixels().div_ceil(self.base_pixels.max(1)).max(1);
        let total = units
            .saturating_mul(u64::from(samples))
            .saturating_mul(u64::from(self.credits_per_image));
        u32::try_from(total).unwrap_or(u32::MAX)
    }
}

/// Configuration for the access services.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub credit_cost: CreditCost,
    /// Ledger refill policy (default: daily).
    pub reset_period: ResetPeriod,
    /// Maximum prompt length in characters (default: 2000).
    pub max_prompt_chars: usize,
    /// Minimum images per request (default: 1).
    pub min_samples: u32,
    /// Maximum images per request (default: 4).
    pub max_samples: u32,
    /// Lowest accepted guidance scale (default: 0.0).
    pub min_guidance_scale: f32,
    /// Highest accepted guidance scale (default: 35.0).
    pub max_guidance_scale: f32,
    /// Prompt characters kept in a creation title (default: 50).
    pub title_max_chars: usize,
    /// Newest public creations shown in the gallery (default: 12).
    pub recent_gallery_size: u64,
    /// Most-liked public creations shown as trending (default: 6).
    pub trending_gallery_size: u64,
    /// Contest entries shown (default: 8).
    pub contest_gallery_size: u64,
    /// Page size for a user's own creations (default: 50).
    pub my_creations_page_size: u64,
    /// Payment provider price id of the Pro plan.
    pub pro_price_id: String,
    /// Payment provider price id of the Studio plan.
    pub studio_price_id: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            credit_cost: CreditCost::default(),
            reset_period: ResetPeriod::default(),
            max_prompt_chars: 2000,
            min_samples: 1,
            max_samples: 4,
            min_guidance_scale: 0.0,
            max_guidance_scale: 35.0,
            title_max_chars: 50,
            recent_gallery_size: 12,
            trending_gallery_size: 6,
            contest_gallery_size: 8,
            my_creations_page_size: 50,
            pro_price_id: String::new(),
            studio_price_id: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smallest_image_costs_one_credit() {
        let cost = CreditCost::default();
        assert_eq!(cost.credits_for(Resolution::Square512, 1), 1);
    }

    #[test]
    fn each_resolution_step_costs_more() {
        let cost = CreditCost::default();
        let small = cost.credits_for(Resolution::Square512, 1);
        let standard = cost.credits_for(Resolution::Square1024, 1);
        let uhd = cost.credits_for(Resolution::Uhd4K, 1);
        assert!(small < standard && standard < uhd);
        assert_eq!((small, standard, uhd), (1, 4, 32));
    }

    #[test]
    fn cost_scales_with_samples_and_area() {
        let cost = CreditCost::default();
        assert_eq!(cost.credits_for(Resolution::Square1024, 4), 16);
        // 3840×2160 spans 32 started 512×512 units.
        assert_eq!(cost.credits_for(Resolution::Uhd4K, 2), 64);
    }

    #[test]
    fn multiplier_is_configurable() {
        let cost = CreditCost {
            credits_per_image: 3,
            base_pixels: 1024 * 1024,
        };
        assert_eq!(cost.credits_for(Resolution::Square512, 1), 3);
        assert_eq!(cost.credits_for(Resolution::Square1024, 1), 3);
        assert_eq!(cost.credits_for(Resolution::Uhd4K, 1), 24);
    }

    #[test]
    fn zero_base_pixels_does_not_panic() {
        let cost = CreditCost {
            credits_per_image: 1,
            base_pixels: 0,
        };
        assert_eq!(cost.credits_for(Resolution::Square512, 1), 262_144);
    }
}
