use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Image {
    pub id: Uuid,
    pub title: String,
    pub public_id: String,
    pub width: i32,
    pub height: i32,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewImage {
    pub title: String,
    pub public_id: String,
    pub width: i32,
    pub height: i32,
    pub owner_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDto {
    pub id: Uuid,
    pub title: String,
    pub public_id: String,
    pub width: i32,
    pub height: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Image> for ImageDto {
    fn from(i: Image) -> Self {
        Self {
            id: i.id,
            title: i.title,
            public_id: i.public_id,
            width: i.width,
            height: i.height,
            created_at: i.created_at,
            updated_at: i.updated_at,
        }
    }
}
