//! Repository trait for persisted creations.
//!
//! All operations are async. The storage service offers CRUD only;
//! no multi-record transaction is assumed.

use uuid::Uuid;

use crate::error::DreamforgeResult;
use crate::models::creation::{CreateCreation, Creation, CreationQuery, UpdateCreation};

pub trait CreationRepository: Send + Sync {
    fn create(
        &self,
        input: CreateCreation,
    ) -> impl Future<Output = DreamforgeResult<Creation>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = DreamforgeResult<Creation>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateCreation,
    ) -> impl Future<Output = DreamforgeResult<Creation>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = DreamforgeResult<()>> + Send;
    fn query(
        &self,
        query: CreationQuery,
    ) -> impl Future<Output = DreamforgeResult<Vec<Creation>>> + Send;
    /// Record that `user_id` likes `creation_id` and bump its like
    /// counter. Fails with `AlreadyExists` on a repeated like.
    fn record_like(
        &self,
        creation_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = DreamforgeResult<Creation>> + Send;
}
