pub mod models;
mod postgres;

pub use postgres::PgVaultStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use models::{Image, NewImage, NewVideo, User, Video};

/// Errors from the vault store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    /// Unique constraint violation on the named column
    #[error("Duplicate value for {0}")]
    Conflict(String),

    /// Referential constraint rejected the operation (e.g. deleting a user
    /// whose content records still reference it)
    #[error("Referential constraint violation: {0}")]
    ForeignKeyViolation(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// VaultStore defines the metadata persistence interface.
///
/// The Postgres implementation is the production backend; the test support
/// module provides an in-memory one.
#[async_trait]
pub trait VaultStore: Send + Sync {
    /// Ping the backing store; used by the health endpoint.
    async fn health_check(&self) -> Result<(), StoreError>;

    // User identity mirror
    /// Insert or refresh the mirror row keyed by external id. Only the email
    /// changes on conflict; a set username is never touched here.
    async fn upsert_user(&self, external_id: &str, email: &str) -> Result<User, StoreError>;
    async fn user_by_external_id(&self, external_id: &str) -> Result<Option<User>, StoreError>;
    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    /// Upsert keyed by external id, setting the username. Fails with
    /// `Conflict("username")` when another identity already holds it.
    async fn set_username(
        &self,
        external_id: &str,
        email: &str,
        username: &str,
    ) -> Result<User, StoreError>;
    /// Delete the mirror row. Fails with `ForeignKeyViolation` if content
    /// records still reference it.
    async fn delete_user(&self, external_id: &str) -> Result<bool, StoreError>;

    // Videos
    async fn insert_video(&self, video: NewVideo) -> Result<Video, StoreError>;
    async fn video_by_id(&self, id: Uuid) -> Result<Option<Video>, StoreError>;
    /// Owner-scoped listing, newest-first by creation time.
    async fn videos_for_owner(&self, owner_id: Uuid) -> Result<Vec<Video>, StoreError>;
    async fn update_video(
        &self,
        id: Uuid,
        title: &str,
        description: Option<&str>,
    ) -> Result<Video, StoreError>;
    async fn delete_video(&self, id: Uuid) -> Result<bool, StoreError>;

    // Images
    async fn insert_image(&self, image: NewImage) -> Result<Image, StoreError>;
    async fn image_by_id(&self, id: Uuid) -> Result<Option<Image>, StoreError>;
    async fn images_for_owner(&self, owner_id: Uuid) -> Result<Vec<Image>, StoreError>;
    async fn update_image(&self, id: Uuid, title: &str) -> Result<Image, StoreError>;
    async fn delete_image(&self, id: Uuid) -> Result<bool, StoreError>;
}
