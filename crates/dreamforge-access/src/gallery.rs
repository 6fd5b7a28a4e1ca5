//! Community galleries and personal creation management.

use dreamforge_core::error::{DreamforgeError, DreamforgeResult};
use dreamforge_core::models::creation::{
    Creation, CreationFilter, CreationOrder, CreationQuery, UpdateCreation,
};
use dreamforge_core::models::entitlement::Capability;
use dreamforge_core::models::generation::Visibility;
use dreamforge_core::repository::CreationRepository;
use tracing::info;
use uuid::Uuid;

use crate::config::AccessConfig;
use crate::error::AccessError;
use crate::gate::FeatureGate;

pub struct GalleryService<R: CreationRepository> {
    creations: R,
    gate: FeatureGate,
    config: AccessConfig,
}

impl<R: CreationRepository> GalleryService<R> {
    pub fn new(creations: R, gate: FeatureGate, config: AccessConfig) -> Self {
        Self {
            creations,
            gate,
            config,
        }
    }

    /// Newest public creations.
    pub async fn recent_public(&self) -> DreamforgeResult<Vec<Creation>> {
        self.gate.require(Capability::GalleryAccess)?;
        self.creations
            .query(public_query(
                CreationOrder::Newest,
                false,
                self.config.recent_gallery_size,
            ))
            .await
    }

    /// Most-liked public creations.
    pub async fn trending(&self) -> DreamforgeResult<Vec<Creation>> {
        self.gate.require(Capability::GalleryAccess)?;
        self.creations
            .query(public_query(
                CreationOrder::MostLiked,
                false,
                self.config.trending_gallery_size,
            ))
            .await
    }

    /// Most-liked public contest entries.
    pub async fn contest_entries(&self) -> DreamforgeResult<Vec<Creation>> {
        self.gate.require(Capability::Contests)?;
        self.creations
            .query(public_query(
                CreationOrder::MostLiked,
                true,
                self.config.contest_gallery_size,
            ))
            .await
    }

    /// `user_id`'s own creations, public and private, newest first.
    pub async fn my_creations(&self, user_id: Uuid) -> DreamforgeResult<Vec<Creation>> {
        self.creations
            .query(CreationQuery {
                filter: CreationFilter {
                    owner: Some(user_id),
                    ..Default::default()
                },
                order: CreationOrder::Newest,
                limit: self.config.my_creations_page_size,
            })
            .await
    }

    /// Like a creation once. Private creations of other users are
    /// reported as not found.
    pub async fn like(&self, user_id: Uuid, creation_id: Uuid) -> DreamforgeResult<Creation> {
        self.gate.require(Capability::LikeAndSave)?;
        let creation = self.creations.get_by_id(creation_id).await?;
        if !creation.is_public && creation.user_id != user_id {
            return Err(DreamforgeError::NotFound {
                entity: "creation".into(),
                id: creation_id.to_string(),
            });
        }
        self.creations.record_like(creation_id, user_id).await
    }

    pub async fn set_visibility(
        &self,
        user_id: Uuid,
        creation_id: Uuid,
        visibility: Visibility,
    ) -> DreamforgeResult<Creation> {
        self.owned(user_id, creation_id).await?;
        if visibility == Visibility::Private {
            self.gate.require(Capability::PrivateCreations)?;
        }
        let mut update = UpdateCreation {
            is_public: Some(visibility.is_public()),
            ..Default::default()
        };
        if !visibility.is_public() {
            // Contest entries must stay public.
            update.is_contest_entry = Some(false);
        }
        let updated = self.creations.update(creation_id, update).await?;
        info!(%creation_id, ?visibility, "Creation visibility changed");
        Ok(updated)
    }

    /// Submit a public creation to the contest gallery.
    pub async fn enter_contest(
        &self,
        user_id: Uuid,
        creation_id: Uuid,
    ) -> DreamforgeResult<Creation> {
        self.gate.require(Capability::Contests)?;
        let creation = self.owned(user_id, creation_id).await?;
        if !creation.is_public {
            return Err(DreamforgeError::validation(
                "only public creations can enter contests",
            ));
        }
        self.creations
            .update(
                creation_id,
                UpdateCreation {
                    is_contest_entry: Some(true),
                    ..Default::default()
                },
            )
            .await
    }

    pub async fn delete(&self, user_id: Uuid, creation_id: Uuid) -> DreamforgeResult<()> {
        self.owned(user_id, creation_id).await?;
        self.creations.delete(creation_id).await?;
        info!(%creation_id, "Creation deleted");
        Ok(())
    }

    async fn owned(&self, user_id: Uuid, creation_id: Uuid) -> DreamforgeResult<Creation> {
        let creation = self.creations.get_by_id(creation_id).await?;
        if creation.user_id != user_id {
            return Err(AccessError::NotOwner.into());
        }
        Ok(creation)
    }
}

fn public_query(order: CreationOrder, contest_only: bool, limit: u64) -> CreationQuery {
    CreationQuery {
        filter: CreationFilter {
            owner: None,
            public_only: true,
            contest_only,
        },
        order,
        limit,
    }
}
