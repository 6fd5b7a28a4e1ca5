//! Generation service: One generate action, end to end.

use std::sync::Arc;

use chrono::Utc;
use dreamforge_core::error::{DreamforgeError, DreamforgeResult, ExternalService};
use dreamforge_core::gateway::ImageGenerator;
use dreamforge_core::models::creation::{CreateCreation, Creation, title_from_prompt};
use dreamforge_core::models::entitlement::Capability;
use dreamforge_core::models::generation::{GeneratedImage, GenerationRequest, Visibility};
use dreamforge_core::repository::CreationRepository;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AccessConfig;
use crate::error::AccessError;
use crate::gate::FeatureGate;
use crate::ledger::{CreditBalance, CreditLedger, Debit};

/// Result of a successful generation.
#[derive(Debug)]
pub struct GenerationOutcome {
    /// One saved creation per generated image, in provider order.
    pub creations: Vec<Creation>,
    pub credits_spent: u32,
    /// Balance after the debit.
    pub balance: CreditBalance,
}

/// Check the request shape. Makes no external calls.
pub fn validate_request(
    request: &GenerationRequest,
    config: &AccessConfig,
) -> Result<(), AccessError> {
    let prompt = request.prompt.trim();
    if prompt.is_empty() {
        return Err(AccessError::EmptyPrompt);
    }
    if prompt.chars().count() > config.max_prompt_chars {
        return Err(AccessError::PromptTooLong {
            max: config.max_prompt_chars,
        });
    }
    if !(config.min_samples..=config.max_samples).contains(&request.sample_count) {
        return Err(AccessError::SampleCount {
            requested: request.sample_count,
            min: config.min_samples,
            max: config.max_samples,
        });
    }
    let guidance = request.guidance_scale;
    if !guidance.is_finite()
        || guidance < config.min_guidance_scale
        || guidance > config.max_guidance_scale
    {
        return Err(AccessError::GuidanceScale {
            requested: guidance,
            min: config.min_guidance_scale,
            max: config.max_guidance_scale,
        });
    }
    Ok(())
}

/// Generation service.
///
/// Generic over the provider and the creation store so the access
/// layer does not depend on the HTTP or database crates.
pub struct GenerationService<G: ImageGenerator, R: CreationRepository> {
    generator: G,
    creations: R,
    gate: FeatureGate,
    ledger: Arc<CreditLedger>,
    config: AccessConfig,
}

impl<G: ImageGenerator, R: CreationRepository> GenerationService<G, R> {
    pub fn new(
        generator: G,
        creations: R,
        gate: FeatureGate,
        ledger: Arc<CreditLedger>,
        config: AccessConfig,
    ) -> Self {
        Self {
            generator,
            creations,
            gate,
            ledger,
            config,
        }
    }

    /// Credits `request` would cost.
    pub fn quote(&self, request: &GenerationRequest) -> u32 {
        self.config
            .credit_cost
            .credits_for(request.resolution, request.sample_count)
    }

    /// Generate and save images for `user_id`.
    ///
    /// Credits are debited before the provider is called and refunded
    /// if the provider fails or the images cannot be saved.
    pub async fn generate(
        &self,
        user_id: Uuid,
        request: GenerationRequest,
    ) -> DreamforgeResult<GenerationOutcome> {
        // 1. Validate the request.
        validate_request(&request, &self.config)?;

        // 2. Check plan limits.
        self.gate.require_resolution(request.resolution)?;
        let visibility = self.resolve_visibility(request.visibility)?;

        // 3. Price and debit.
        let cost = self.quote(&request);
        let Some(debit) = self.ledger.debit(cost) else {
            return Err(AccessError::InsufficientCredits {
                required: cost,
                available: self.ledger.balance().available().unwrap_or(0),
            }
            .into());
        };

        // 4. Call the provider.
        info!(
            %user_id,
            resolution = %request.resolution,
            samples = request.sample_count,
            cost,
            "Requesting generation"
        );
        let images = match self.generator.generate(request.to_provider_request()).await {
            Ok(images) if !images.is_empty() => images,
            Ok(_) => {
                self.refund(debit, "provider returned no images");
                return Err(DreamforgeError::external(
                    ExternalService::Generation,
                    None,
                    "provider returned no images",
                ));
            }
            Err(e) => {
                self.refund(debit, "provider failed");
                return Err(e);
            }
        };

        // 5. Persist the batch.
        let creations = match self.persist(user_id, &request, visibility, &images).await {
            Ok(creations) => creations,
            Err(e) => {
                self.refund(debit, "persistence failed");
                return Err(e);
            }
        };

        info!(%user_id, images = creations.len(), "Generation saved");

        Ok(GenerationOutcome {
            creations,
            credits_spent: cost,
            balance: self.ledger.balance(),
        })
    }

    /// Community creations are always public; paid plans may keep
    /// theirs private.
    fn resolve_visibility(&self, requested: Option<Visibility>) -> Result<Visibility, AccessError> {
        match requested.unwrap_or_default() {
            Visibility::Public => Ok(Visibility::Public),
            Visibility::Private => {
                self.gate.require(Capability::PrivateCreations)?;
                Ok(Visibility::Private)
            }
        }
    }

    /// Save every image, deleting already-saved ones if a later save fails.
    async fn persist(
        &self,
        user_id: Uuid,
        request: &GenerationRequest,
        visibility: Visibility,
        images: &[GeneratedImage],
    ) -> DreamforgeResult<Vec<Creation>> {
        let prompt = request.prompt.trim();
        let title = title_from_prompt(prompt, self.config.title_max_chars);
        let created_at = Utc::now();

        let mut saved = Vec::with_capacity(images.len());
        for image in images {
            let result = self
                .creations
                .create(CreateCreation {
                    user_id,
                    title: title.clone(),
                    description: prompt.to_string(),
                    image_url: image.data_url(),
                    prompt: prompt.to_string(),
                    is_public: visibility.is_public(),
                    created_at,
                })
                .await;

            match result {
                Ok(creation) => saved.push(creation),
                Err(e) => {
                    warn!(
                        error = %e,
                        index = image.index,
                        "Saving creation failed, rolling back batch"
                    );
                    for creation in &saved {
                        if let Err(cleanup) = self.creations.delete(creation.id).await {
                            warn!(
                                error = %cleanup,
                                creation_id = %creation.id,
                                "Rollback delete failed"
                            );
                        }
                    }
                    return Err(e);
                }
            }
        }
        Ok(saved)
    }

    fn refund(&self, debit: Debit, reason: &str) {
        warn!(amount = debit.amount, reason, "Refunding generation credits");
        self.ledger.refund(debit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_request_is_valid() {
        let request = GenerationRequest::new("a lighthouse");
        assert!(validate_request(&request, &AccessConfig::default()).is_ok());
    }

    #[test]
    fn blank_prompt_is_rejected() {
        let err =
            validate_request(&GenerationRequest::new("   "), &AccessConfig::default()).unwrap_err();
        assert!(matches!(err, AccessError::EmptyPrompt));
    }

    #[test]
    fn long_prompt_is_rejected() {
        let config = AccessConfig {
            max_prompt_chars: 10,
            ..Default::default()
        };
        let err = validate_request(&GenerationRequest::new("a".repeat(11)), &config).unwrap_err();
        assert!(matches!(err, AccessError::PromptTooLong { max: 10 }));
    }

    #[test]
    fn sample_bounds() {
        let config = AccessConfig::default();
        assert!(validate_request(&GenerationRequest::new("x").with_samples(4), &config).is_ok());
        assert!(matches!(
            validate_request(&GenerationRequest::new("x").with_samples(0), &config),
            Err(AccessError::SampleCount { requested: 0, .. })
        ));
        assert!(matches!(
            validate_request(&GenerationRequest::new("x").with_samples(5), &config),
            Err(AccessError::SampleCount { requested: 5, .. })
        ));
    }

    #[test]
    fn guidance_bounds() {
        let config = AccessConfig::default();
        let mut request = GenerationRequest::new("x");
        request.guidance_scale = f32::NAN;
        assert!(matches!(
            validate_request(&request, &config),
            Err(AccessError::GuidanceScale { .. })
        ));
        request.guidance_scale = 40.0;
        assert!(validate_request(&request, &config).is_err());
    }
}
