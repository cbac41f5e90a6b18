use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Video metadata row. The binary itself lives in the external media service
/// under `public_id`. Size fields are stored as text (string-safe wide
/// representation) and coerced to numbers in the outbound DTO.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Video {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub public_id: String,
    pub original_size: String,
    pub compressed_size: String,
    pub duration: f64,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a new video. There is no corresponding update shape
/// for `owner_id`; ownership is immutable after creation.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub title: String,
    pub description: Option<String>,
    pub public_id: String,
    pub original_size: String,
    pub compressed_size: String,
    pub duration: f64,
    pub owner_id: Uuid,
}

/// Outbound representation with size fields normalized to numbers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDto {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub public_id: String,
    pub original_size: i64,
    pub compressed_size: i64,
    pub duration: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Video> for VideoDto {
    fn from(v: Video) -> Self {
        Self {
            id: v.id,
            title: v.title,
            description: v.description,
            public_id: v.public_id,
            original_size: v.original_size.parse().unwrap_or(0),
            compressed_size: v.compressed_size.parse().unwrap_or(0),
            duration: v.duration,
            created_at: v.created_at,
            updated_at: v.updated_at,
        }
    }
}
