mod cloudinary;

pub use cloudinary::CloudinaryService;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Image,
    Video,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Image => "image",
            ResourceType::Video => "video",
        }
    }
}

/// An upload request: the binary plus the server-chosen placement and an
/// optional transcoding directive.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub data: Vec<u8>,
    pub resource_type: ResourceType,
    pub folder: String,
    /// Transformation string applied on upload (e.g. "q_auto,f_mp4").
    pub transformation: Option<String>,
}

/// What the media service reports back after storing a binary.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub public_id: String,
    pub bytes: i64,
    pub duration: Option<f64>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Media service credentials not configured")]
    NotConfigured,

    #[error("Media service request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Media service rejected the request: {0}")]
    Rejected(String),
}

/// External media storage. Uploads and deletes are not covered by any local
/// transaction; callers sequence them against the metadata store themselves.
#[async_trait]
pub trait MediaService: Send + Sync {
    async fn upload(&self, request: UploadRequest) -> Result<MediaUpload, MediaError>;
    async fn destroy(
        &self,
        public_id: &str,
        resource_type: ResourceType,
    ) -> Result<(), MediaError>;
}
