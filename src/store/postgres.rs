use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;
use uuid::Uuid;

use super::models::{Image, NewImage, NewVideo, User, Video};
use super::{StoreError, VaultStore};

/// Bootstrap DDL, executed at startup. Foreign keys are RESTRICT: deleting a
/// user whose content still exists is rejected rather than cascaded.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id          UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    external_id TEXT NOT NULL UNIQUE,
    email       TEXT NOT NULL,
    username    TEXT UNIQUE,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS videos (
    id              UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    title           TEXT NOT NULL,
    description     TEXT,
    public_id       TEXT NOT NULL,
    original_size   TEXT NOT NULL,
    compressed_size TEXT NOT NULL,
    duration        DOUBLE PRECISION NOT NULL DEFAULT 0,
    owner_id        UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS images (
    id         UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    title      TEXT NOT NULL,
    public_id  TEXT NOT NULL,
    width      INTEGER NOT NULL,
    height     INTEGER NOT NULL,
    owner_id   UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS videos_owner_created_idx ON videos (owner_id, created_at DESC);
CREATE INDEX IF NOT EXISTS images_owner_created_idx ON images (owner_id, created_at DESC);
"#;

/// Postgres-backed vault store. Holds the single process-wide pool; handlers
/// receive it through `AppState` and never open their own connections.
pub struct PgVaultStore {
    pool: PgPool,
}

impl PgVaultStore {
    /// Connect the shared pool and run the bootstrap DDL.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        let store = Self { pool };
        store.initialize().await?;
        info!("Database pool ready ({} max connections)", max_connections);
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn initialize(&self) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for statement in SCHEMA.split(';').filter(|s| !s.trim().is_empty()) {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

/// Map constraint violations onto store error variants. Postgres reports
/// unique violations as 23505 and FK violations as 23503.
fn map_db_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        match db_err.code().as_deref() {
            Some("23505") => {
                let constraint = db_err.constraint().unwrap_or_default();
                let column = if constraint.contains("username") {
                    "username"
                } else if constraint.contains("external_id") {
                    "external_id"
                } else {
                    "unique field"
                };
                return StoreError::Conflict(column.to_string());
            }
            Some("23503") => {
                return StoreError::ForeignKeyViolation(db_err.message().to_string());
            }
            _ => {}
        }
    }
    StoreError::Sqlx(err)
}

#[async_trait]
impl VaultStore for PgVaultStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn upsert_user(&self, external_id: &str, email: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"INSERT INTO users (external_id, email)
               VALUES ($1, $2)
               ON CONFLICT (external_id)
               DO UPDATE SET email = EXCLUDED.email, updated_at = now()
               RETURNING *"#,
        )
        .bind(external_id)
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    async fn user_by_external_id(&self, external_id: &str) -> Result<Option<User>, StoreError> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE external_id = $1")
                .bind(external_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn set_username(
        &self,
        external_id: &str,
        email: &str,
        username: &str,
    ) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"INSERT INTO users (external_id, email, username)
               VALUES ($1, $2, $3)
               ON CONFLICT (external_id)
               DO UPDATE SET username = EXCLUDED.username, updated_at = now()
               RETURNING *"#,
        )
        .bind(external_id)
        .bind(email)
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    async fn delete_user(&self, external_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE external_id = $1")
            .bind(external_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_video(&self, video: NewVideo) -> Result<Video, StoreError> {
        sqlx::query_as::<_, Video>(
            r#"INSERT INTO videos
               (title, description, public_id, original_size, compressed_size, duration, owner_id)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING *"#,
        )
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.public_id)
        .bind(&video.original_size)
        .bind(&video.compressed_size)
        .bind(video.duration)
        .bind(video.owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    async fn video_by_id(&self, id: Uuid) -> Result<Option<Video>, StoreError> {
        Ok(
            sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn videos_for_owner(&self, owner_id: Uuid) -> Result<Vec<Video>, StoreError> {
        Ok(sqlx::query_as::<_, Video>(
            "SELECT * FROM videos WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_video(
        &self,
        id: Uuid,
        title: &str,
        description: Option<&str>,
    ) -> Result<Video, StoreError> {
        sqlx::query_as::<_, Video>(
            r#"UPDATE videos
               SET title = $2, description = $3, updated_at = now()
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn delete_video(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_image(&self, image: NewImage) -> Result<Image, StoreError> {
        sqlx::query_as::<_, Image>(
            r#"INSERT INTO images (title, public_id, width, height, owner_id)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING *"#,
        )
        .bind(&image.title)
        .bind(&image.public_id)
        .bind(image.width)
        .bind(image.height)
        .bind(image.owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    async fn image_by_id(&self, id: Uuid) -> Result<Option<Image>, StoreError> {
        Ok(
            sqlx::query_as::<_, Image>("SELECT * FROM images WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn images_for_owner(&self, owner_id: Uuid) -> Result<Vec<Image>, StoreError> {
        Ok(sqlx::query_as::<_, Image>(
            "SELECT * FROM images WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_image(&self, id: Uuid, title: &str) -> Result<Image, StoreError> {
        sqlx::query_as::<_, Image>(
            r#"UPDATE images
               SET title = $2, updated_at = now()
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(title)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn delete_image(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM images WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
