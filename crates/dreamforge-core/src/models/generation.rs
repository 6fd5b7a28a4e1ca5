//! Generation request and provider result models.

use serde::{Deserialize, Serialize};

use super::entitlement::Resolution;

pub const DEFAULT_STYLE: &str = "realistic";
pub const DEFAULT_GUIDANCE_SCALE: f32 = 7.0;

/// Who can see a saved creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn is_public(&self) -> bool {
        matches!(self, Visibility::Public)
    }
}

/// A single generate action as submitted by the user. Consumed once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub resolution: Resolution,
    pub sample_count: u32,
    pub style: String,
    pub guidance_scale: f32,
    pub seed: Option<u32>,
    /// `None` lets the tier decide (public).
    pub visibility: Option<Visibility>,
}

impl GenerationRequest {
    /// A request with the web client's defaults: one 1024×1024
    /// "realistic" image at guidance 7.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: None,
            resolution: Resolution::default(),
            sample_count: 1,
            style: DEFAULT_STYLE.into(),
            guidance_scale: DEFAULT_GUIDANCE_SCALE,
            seed: None,
            visibility: None,
        }
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_samples(mut self, sample_count: u32) -> Self {
        self.sample_count = sample_count;
        self
    }

    pub fn with_negative_prompt(mut self, negative: impl Into<String>) -> Self {
        self.negative_prompt = Some(negative.into());
        self
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// Provider parameters for this request.
    pub fn to_provider_request(&self) -> ProviderRequest {
        let (width, height) = self.resolution.dimensions();
        ProviderRequest {
            prompt: self.prompt.trim().to_string(),
            negative_prompt: self
                .negative_prompt
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            width,
            height,
            sample_count: self.sample_count,
            guidance_scale: self.guidance_scale,
            seed: self.seed,
            style: Some(self.style.clone()).filter(|s| !s.trim().is_empty()),
        }
    }
}

/// Parameters passed to the image-generation provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRequest {
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub width: u32,
    pub height: u32,
    pub sample_count: u32,
    pub guidance_scale: f32,
    pub seed: Option<u32>,
    pub style: Option<String>,
}

/// One image returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub index: u32,
    /// Base64-encoded PNG.
    pub image_data: String,
}

impl GeneratedImage {
    pub fn data_url(&self) -> String {
        format!("data:image/png;base64,{}", self.image_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_request_drops_blank_negative_prompt() {
        let req = GenerationRequest::new("  a castle  ").with_negative_prompt("   ");
        let provider = req.to_provider_request();
        assert_eq!(provider.prompt, "a castle");
        assert_eq!(provider.negative_prompt, None);
        assert_eq!((provider.width, provider.height), (1024, 1024));
        assert_eq!(provider.style.as_deref(), Some("realistic"));
    }

    #[test]
    fn data_url_prefix() {
        let image = GeneratedImage {
            index: 0,
            image_data: "iVBORw0KGgo=".into(),
        };
        assert_eq!(image.data_url(), "data:image/png;base64,iVBORw0KGgo=");
    }
}
