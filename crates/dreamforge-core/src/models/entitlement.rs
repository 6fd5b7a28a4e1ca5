//! Entitlement table: what each subscription tier may do.
//!
//! The table is keyed by [`SubscriptionTier`] through an exhaustive
//! `match`, so adding a tier without entitlements fails to compile.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::tier::SubscriptionTier;

/// A named capability flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    // AI tooling
    AiAssistant,
    PromptSuggestions,
    LivePreview,
    PromptTemplates,
    PromptRefinementBot,
    StyleAdvisor,

    // Output
    HdExport,
    PrivateCreations,

    // Gallery
    GalleryAccess,
    LikeAndSave,
    Contests,
    GalleryBoost,

    // Advanced editing
    ImageEditor,
    Inpainting,
    ImageToImage,
    ControlNet,

    // Developer tools
    ApiAccess,
    Webhooks,
    PluginSupport,
    SdkAccess,

    // Support
    PrioritySupport,
    EarlyAccess,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::AiAssistant => "ai_assistant",
            Capability::PromptSuggestions => "prompt_suggestions",
            Capability::LivePreview => "live_preview",
            Capability::PromptTemplates => "prompt_templates",
            Capability::PromptRefinementBot => "prompt_refinement_bot",
            Capability::StyleAdvisor => "style_advisor",
            Capability::HdExport => "hd_export",
            Capability::PrivateCreations => "private_creations",
            Capability::GalleryAccess => "gallery_access",
            Capability::LikeAndSave => "like_and_save",
            Capability::Contests => "contests",
            Capability::GalleryBoost => "gallery_boost",
            Capability::ImageEditor => "image_editor",
            Capability::Inpainting => "inpainting",
            Capability::ImageToImage => "image_to_image",
            Capability::ControlNet => "control_net",
            Capability::ApiAccess => "api_access",
            Capability::Webhooks => "webhooks",
            Capability::PluginSupport => "plugin_support",
            Capability::SdkAccess => "sdk_access",
            Capability::PrioritySupport => "priority_support",
            Capability::EarlyAccess => "early_access",
        }
    }

    /// Parse a feature name in any of the spellings used by the web
    /// client (`hasPromptSuggestions`, `prompt_suggestions`,
    /// `canUseAIBot`, ...).
    pub fn from_feature(value: &str) -> Option<Self> {
        let normalized: String = value
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect();
        let normalized = normalized
            .strip_prefix("has")
            .or_else(|| normalized.strip_prefix("can"))
            .unwrap_or(&normalized);
        match normalized {
            "aiassistant" | "useaibot" => Some(Capability::AiAssistant),
            "promptsuggestions" => Some(Capability::PromptSuggestions),
            "livepreview" => Some(Capability::LivePreview),
            "prompttemplates" => Some(Capability::PromptTemplates),
            "promptrefinementbot" => Some(Capability::PromptRefinementBot),
            "styleadvisor" => Some(Capability::StyleAdvisor),
            "hdexport" | "exporthd" => Some(Capability::HdExport),
            "privatecreations" => Some(Capability::PrivateCreations),
            "galleryaccess" | "accessgallery" => Some(Capability::GalleryAccess),
            "likeandsave" => Some(Capability::LikeAndSave),
            "contests" | "accesscontests" => Some(Capability::Contests),
            "galleryboost" => Some(Capability::GalleryBoost),
            "imageeditor" => Some(Capability::ImageEditor),
            "inpainting" => Some(Capability::Inpainting),
            "imagetoimage" => Some(Capability::ImageToImage),
            "controlnet" => Some(Capability::ControlNet),
            "apiaccess" => Some(Capability::ApiAccess),
            "webhooks" => Some(Capability::Webhooks),
            "pluginsupport" => Some(Capability::PluginSupport),
            "sdkaccess" => Some(Capability::SdkAccess),
            "prioritysupport" => Some(Capability::PrioritySupport),
            "earlyaccess" => Some(Capability::EarlyAccess),
            _ => None,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output resolution, ordered from smallest to largest.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Resolution {
    #[serde(rename = "512")]
    Square512,
    #[default]
    #[serde(rename = "1024")]
    Square1024,
    #[serde(rename = "4K")]
    Uhd4K,
}

impl Resolution {
    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Resolution::Square512 => (512, 512),
            Resolution::Square1024 => (1024, 1024),
            Resolution::Uhd4K => (3840, 2160),
        }
    }

    pub fn pixels(&self) -> u64 {
        let (w, h) = self.dimensions();
        u64::from(w) * u64::from(h)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Resolution::Square512 => "512×512",
            Resolution::Square1024 => "1024×1024",
            Resolution::Uhd4K => "4K",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "512" | "512x512" => Some(Resolution::Square512),
            "1024" | "1024x1024" => Some(Resolution::Square1024),
            "4k" => Some(Resolution::Uhd4K),
            _ => None,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExportFormat {
    Png,
    Jpg,
    Psd,
    Svg,
}

/// Generations allowed per period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationLimit {
    Daily(u32),
    Unlimited,
}

impl GenerationLimit {
    pub fn is_unlimited(&self) -> bool {
        matches!(self, GenerationLimit::Unlimited)
    }
}

impl fmt::Display for GenerationLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationLimit::Daily(n) => write!(f, "{n}"),
            GenerationLimit::Unlimited => f.write_str("unlimited"),
        }
    }
}

/// The entitlements of one tier. Instances only exist as statics.
#[derive(Debug, PartialEq, Eq)]
pub struct EntitlementSet {
    pub tier: SubscriptionTier,
    pub generation_limit: GenerationLimit,
    pub max_resolution: Resolution,
    pub export_formats: &'static [ExportFormat],
    pub capabilities: &'static [Capability],
}

impl EntitlementSet {
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn allows_resolution(&self, resolution: Resolution) -> bool {
        resolution <= self.max_resolution
    }

    pub fn allows_export(&self, format: ExportFormat) -> bool {
        self.export_formats.contains(&format)
    }
}

const COMMUNITY_CAPABILITIES: &[Capability] = &[
    Capability::GalleryAccess,
    Capability::LikeAndSave,
    Capability::Contests,
];

const PRO_CAPABILITIES: &[Capability] = &[
    Capability::AiAssistant,
    Capability::PromptSuggestions,
    Capability::LivePreview,
    Capability::PromptTemplates,
    Capability::PromptRefinementBot,
    Capability::StyleAdvisor,
    Capability::HdExport,
    Capability::PrivateCreations,
    Capability::GalleryAccess,
    Capability::LikeAndSave,
    Capability::Contests,
];

const STUDIO_CAPABILITIES: &[Capability] = &[
    Capability::AiAssistant,
    Capability::PromptSuggestions,
    Capability::LivePreview,
    Capability::PromptTemplates,
    Capability::PromptRefinementBot,
    Capability::StyleAdvisor,
    Capability::HdExport,
    Capability::PrivateCreations,
    Capability::GalleryAccess,
    Capability::LikeAndSave,
    Capability::Contests,
    Capability::GalleryBoost,
    Capability::ImageEditor,
    Capability::Inpainting,
    Capability::ImageToImage,
    Capability::ControlNet,
    Capability::ApiAccess,
    Capability::Webhooks,
    Capability::PluginSupport,
    Capability::SdkAccess,
    Capability::PrioritySupport,
    Capability::EarlyAccess,
];

static COMMUNITY: EntitlementSet = EntitlementSet {
    tier: SubscriptionTier::Community,
    generation_limit: GenerationLimit::Daily(5),
    max_resolution: Resolution::Square512,
    export_formats: &[ExportFormat::Png],
    capabilities: COMMUNITY_CAPABILITIES,
};

static PRO: EntitlementSet = EntitlementSet {
    tier: SubscriptionTier::Pro,
    generation_limit: GenerationLimit::Daily(50),
    max_resolution: Resolution::Square1024,
    export_formats: &[ExportFormat::Png, ExportFormat::Jpg],
    capabilities: PRO_CAPABILITIES,
};

static STUDIO: EntitlementSet = EntitlementSet {
    tier: SubscriptionTier::Studio,
    generation_limit: GenerationLimit::Unlimited,
    max_resolution: Resolution::Uhd4K,
    export_formats: &[
        ExportFormat::Psd,
        ExportFormat::Png,
        ExportFormat::Jpg,
        ExportFormat::Svg,
    ],
    capabilities: STUDIO_CAPABILITIES,
};

/// Look up the entitlements of a tier. Pure and total.
pub fn entitlements_for(tier: SubscriptionTier) -> &'static EntitlementSet {
    match tier {
        SubscriptionTier::Community => &COMMUNITY,
        SubscriptionTier::Pro => &PRO,
        SubscriptionTier::Studio => &STUDIO,
    }
}

/// Tiers that grant `capability`, cheapest first.
pub fn tiers_with(capability: Capability) -> Vec<SubscriptionTier> {
    SubscriptionTier::ALL
        .into_iter()
        .filter(|tier| entitlements_for(*tier).has(capability))
        .collect()
}
