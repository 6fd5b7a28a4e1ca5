//! Stability text-to-image client.

use std::time::Duration;

use dreamforge_core::error::{DreamforgeResult, ExternalService};
use dreamforge_core::gateway::ImageGenerator;
use dreamforge_core::models::generation::{GeneratedImage, ProviderRequest};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::StabilityConfig;
use crate::error::RemoteError;

const SERVICE: ExternalService = ExternalService::Generation;

/// Sizes the 1024-class engine accepts.
const NATIVE_DIMENSIONS: [(u32, u32); 9] = [
    (1024, 1024),
    (1152, 896),
    (896, 1152),
    (1216, 832),
    (832, 1216),
    (1344, 768),
    (768, 1344),
    (1536, 640),
    (640, 1536),
];

/// Engine and output size a request is sent with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Target<'a> {
    engine: &'a str,
    width: u32,
    height: u32,
}

/// Pick the engine that can render `width`×`height`.
///
/// Native sizes go to the main engine and small multiples of 64 to the
/// small engine. Anything else, such as 4K, is rendered at the native
/// size closest in aspect ratio.
fn target(config: &StabilityConfig, width: u32, height: u32) -> Target<'_> {
    if NATIVE_DIMENSIONS.contains(&(width, height)) {
        return Target {
            engine: &config.engine,
            width,
            height,
        };
    }
    let small = |side: u32| (320..=1536).contains(&side) && side % 64 == 0;
    if small(width) && small(height) && u64::from(width) * u64::from(height) <= 1024 * 1024 {
        return Target {
            engine: &config.small_engine,
            width,
            height,
        };
    }
    let aspect = f64::from(width) / f64::from(height.max(1));
    let (w, h) = NATIVE_DIMENSIONS
        .into_iter()
        .min_by(|a, b| {
            let da = (f64::from(a.0) / f64::from(a.1) - aspect).abs();
            let db = (f64::from(b.0) / f64::from(b.1) - aspect).abs();
            da.total_cmp(&db)
        })
        .unwrap_or((1024, 1024));
    Target {
        engine: &config.engine,
        width: w,
        height: h,
    }
}

#[derive(Debug, Serialize)]
struct TextPrompt<'a> {
    text: &'a str,
    weight: f32,
}

#[derive(Debug, Serialize)]
struct TextToImageBody<'a> {
    text_prompts: Vec<TextPrompt<'a>>,
    cfg_scale: f32,
    height: u32,
    width: u32,
    samples: u32,
    steps: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    style_preset: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct Artifact {
    base64: String,
}

#[derive(Debug, Deserialize)]
struct TextToImageResponse {
    #[serde(default)]
    artifacts: Vec<Artifact>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Provider preset for a UI style name. Unknown styles are sent without
/// a preset.
fn style_preset(style: &str) -> Option<&'static str> {
    match style.trim().to_ascii_lowercase().as_str() {
        "realistic" | "photographic" => Some("photographic"),
        "anime" => Some("anime"),
        "digital-art" | "digital art" => Some("digital-art"),
        "fantasy" | "fantasy-art" => Some("fantasy-art"),
        "cinematic" => Some("cinematic"),
        "3d" | "3d-model" => Some("3d-model"),
        "pixel-art" | "pixel art" => Some("pixel-art"),
        "comic" | "comic-book" => Some("comic-book"),
        _ => None,
    }
}

fn request_body<'a>(
    request: &'a ProviderRequest,
    target: Target<'_>,
    steps: u32,
) -> TextToImageBody<'a> {
    let mut text_prompts = vec![TextPrompt {
        text: &request.prompt,
        weight: 1.0,
    }];
    if let Some(negative) = request.negative_prompt.as_deref() {
        text_prompts.push(TextPrompt {
            text: negative,
            weight: -1.0,
        });
    }

    TextToImageBody {
        text_prompts,
        cfg_scale: request.guidance_scale,
        height: target.height,
        width: target.width,
        samples: request.sample_count,
        steps,
        seed: request.seed,
        style_preset: request.style.as_deref().and_then(style_preset),
    }
}

/// Error message for a non-2xx response: the body's `message` when
/// present, otherwise a generic status line.
fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("HTTP error! status: {status}"))
}

fn parse_images(body: &str) -> Result<Vec<GeneratedImage>, RemoteError> {
    let response: TextToImageResponse = serde_json::from_str(body)
        .map_err(|e| RemoteError::decode(SERVICE, format!("invalid artifacts payload: {e}")))?;
    Ok(response
        .artifacts
        .into_iter()
        .enumerate()
        .map(|(index, artifact)| GeneratedImage {
            index: index as u32,
            image_data: artifact.base64,
        })
        .collect())
}

#[derive(Clone)]
pub struct StabilityClient {
    http: reqwest::Client,
    config: StabilityConfig,
}

impl StabilityClient {
    pub fn new(config: StabilityConfig) -> Result<Self, RemoteError> {
        if config.api_key.is_empty() {
            return Err(RemoteError::Config("Stability API key is not set".into()));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RemoteError::Config(e.to_string()))?;
        Ok(Self { http, config })
    }

    async fn text_to_image(
        &self,
        request: &ProviderRequest,
    ) -> Result<Vec<GeneratedImage>, RemoteError> {
        let target = target(&self.config, request.width, request.height);
        let body = request_body(request, target, self.config.steps);
        let url = format!(
            "{}/{}/text-to-image",
            self.config.api_base.trim_end_matches('/'),
            target.engine
        );
        debug!(
            engine = target.engine,
            requested_width = request.width,
            requested_height = request.height,
            width = body.width,
            height = body.height,
            samples = body.samples,
            "Sending text-to-image request"
        );

        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.config.api_key)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(RemoteError::request(SERVICE))?;

        let status = resp.status();
        let text = resp.text().await.map_err(RemoteError::request(SERVICE))?;

        if !status.is_success() {
            let message = error_message(status.as_u16(), &text);
            warn!(status = status.as_u16(), %message, "Text-to-image request rejected");
            return Err(RemoteError::Status {
                service: SERVICE,
                status: status.as_u16(),
                message,
            });
        }

        parse_images(&text)
    }
}

impl ImageGenerator for StabilityClient {
    async fn generate(&self, request: ProviderRequest) -> DreamforgeResult<Vec<GeneratedImage>> {
        Ok(self.text_to_image(&request).await?)
    }
}
