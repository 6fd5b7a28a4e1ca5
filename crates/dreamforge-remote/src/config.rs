//! Endpoint configuration for the HTTP adapters.

use serde::Deserialize;

/// Text-to-image provider settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    /// Generation API base URL; the engine id and `/text-to-image` are
    /// appended.
    pub api_base: String,
    /// Engine for sizes on its native 1024-class dimension list.
    pub engine: String,
    /// Engine for smaller sizes (multiples of 64, at most one megapixel).
    pub small_engine: String,
    /// Bearer API key. Empty means generation is unavailable.
    pub api_key: String,
    /// Diffusion steps per image.
    pub steps: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.stability.ai/v1/generation".into(),
            engine: "stable-diffusion-xl-1024-v1-0".into(),
            small_engine: "stable-diffusion-v1-6".into(),
            api_key: String::new(),
            steps: 30,
            timeout_secs: 120,
        }
    }
}

/// Backend project settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Public anon key sent as the `apikey` header.
    pub anon_key: String,
    /// Access token of the signed-in user, if any.
    pub access_token: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            access_token: None,
            timeout_secs: 15,
        }
    }
}
