//! In-process fakes for the storage, media, and identity seams.
//!
//! Integration tests drive the real router against these instead of
//! Postgres/Cloudinary/Clerk; they are also handy for local development
//! without credentials.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::identity::{IdentityError, IdentityProvider, IdentitySnapshot};
use crate::media::{MediaError, MediaService, MediaUpload, ResourceType, UploadRequest};
use crate::store::models::{Image, NewImage, NewVideo, User, Video};
use crate::store::{StoreError, VaultStore};

/// In-memory vault store with the same constraint semantics as Postgres:
/// unique external_id and username, RESTRICT on user deletion.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
    seq: AtomicU64,
}

#[derive(Default)]
struct MemoryInner {
    users: HashMap<Uuid, User>,
    videos: HashMap<Uuid, Video>,
    images: HashMap<Uuid, Image>,
    // Insertion order, used to break creation-time ties deterministically
    video_order: HashMap<Uuid, u64>,
    image_order: HashMap<Uuid, u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VaultStore for MemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn upsert_user(&self, external_id: &str, email: &str) -> Result<User, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(user) = inner
            .users
            .values_mut()
            .find(|u| u.external_id == external_id)
        {
            user.email = email.to_string();
            user.updated_at = Utc::now();
            return Ok(user.clone());
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            external_id: external_id.to_string(),
            email: email.to_string(),
            username: None,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user_by_external_id(&self, external_id: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .values()
            .find(|u| u.external_id == external_id)
            .cloned())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .values()
            .find(|u| u.username.as_deref() == Some(username))
            .cloned())
    }

    async fn set_username(
        &self,
        external_id: &str,
        email: &str,
        username: &str,
    ) -> Result<User, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let taken = inner
            .users
            .values()
            .any(|u| u.username.as_deref() == Some(username) && u.external_id != external_id);
        if taken {
            return Err(StoreError::Conflict("username".to_string()));
        }

        if let Some(user) = inner
            .users
            .values_mut()
            .find(|u| u.external_id == external_id)
        {
            user.username = Some(username.to_string());
            user.updated_at = Utc::now();
            return Ok(user.clone());
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            external_id: external_id.to_string(),
            email: email.to_string(),
            username: Some(username.to_string()),
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete_user(&self, external_id: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(id) = inner
            .users
            .values()
            .find(|u| u.external_id == external_id)
            .map(|u| u.id)
        else {
            return Ok(false);
        };

        let referenced = inner.videos.values().any(|v| v.owner_id == id)
            || inner.images.values().any(|i| i.owner_id == id);
        if referenced {
            return Err(StoreError::ForeignKeyViolation(
                "user is still referenced by content records".to_string(),
            ));
        }

        inner.users.remove(&id);
        Ok(true)
    }

    async fn insert_video(&self, video: NewVideo) -> Result<Video, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();
        let row = Video {
            id: Uuid::new_v4(),
            title: video.title,
            description: video.description,
            public_id: video.public_id,
            original_size: video.original_size,
            compressed_size: video.compressed_size,
            duration: video.duration,
            owner_id: video.owner_id,
            created_at: now,
            updated_at: now,
        };
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        inner.video_order.insert(row.id, seq);
        inner.videos.insert(row.id, row.clone());
        Ok(row)
    }

    async fn video_by_id(&self, id: Uuid) -> Result<Option<Video>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.videos.get(&id).cloned())
    }

    async fn videos_for_owner(&self, owner_id: Uuid) -> Result<Vec<Video>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<Video> = inner
            .videos
            .values()
            .filter(|v| v.owner_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.created_at.cmp(&a.created_at).then_with(|| {
                inner.video_order[&b.id].cmp(&inner.video_order[&a.id])
            })
        });
        Ok(rows)
    }

    async fn update_video(
        &self,
        id: Uuid,
        title: &str,
        description: Option<&str>,
    ) -> Result<Video, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let video = inner.videos.get_mut(&id).ok_or(StoreError::NotFound)?;
        video.title = title.to_string();
        video.description = description.map(str::to_string);
        video.updated_at = Utc::now();
        Ok(video.clone())
    }

    async fn delete_video(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.video_order.remove(&id);
        Ok(inner.videos.remove(&id).is_some())
    }

    async fn insert_image(&self, image: NewImage) -> Result<Image, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();
        let row = Image {
            id: Uuid::new_v4(),
            title: image.title,
            public_id: image.public_id,
            width: image.width,
            height: image.height,
            owner_id: image.owner_id,
            created_at: now,
            updated_at: now,
        };
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        inner.image_order.insert(row.id, seq);
        inner.images.insert(row.id, row.clone());
        Ok(row)
    }

    async fn image_by_id(&self, id: Uuid) -> Result<Option<Image>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.images.get(&id).cloned())
    }

    async fn images_for_owner(&self, owner_id: Uuid) -> Result<Vec<Image>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<Image> = inner
            .images
            .values()
            .filter(|i| i.owner_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.created_at.cmp(&a.created_at).then_with(|| {
                inner.image_order[&b.id].cmp(&inner.image_order[&a.id])
            })
        });
        Ok(rows)
    }

    async fn update_image(&self, id: Uuid, title: &str) -> Result<Image, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let image = inner.images.get_mut(&id).ok_or(StoreError::NotFound)?;
        image.title = title.to_string();
        image.updated_at = Utc::now();
        Ok(image.clone())
    }

    async fn delete_image(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.image_order.remove(&id);
        Ok(inner.images.remove(&id).is_some())
    }
}

/// Media service fake. Uploads succeed with deterministic public ids;
/// failure of either operation can be toggled per test.
#[derive(Default)]
pub struct StubMediaService {
    pub fail_upload: AtomicBool,
    pub fail_destroy: AtomicBool,
    counter: AtomicU64,
    pub destroyed: Mutex<Vec<String>>,
}

impl StubMediaService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MediaService for StubMediaService {
    async fn upload(&self, request: UploadRequest) -> Result<MediaUpload, MediaError> {
        if self.fail_upload.load(Ordering::Relaxed) {
            return Err(MediaError::Rejected("stubbed upload failure".to_string()));
        }
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        Ok(MediaUpload {
            public_id: format!("{}/stub-{}", request.folder, n),
            bytes: request.data.len() as i64,
            duration: match request.resource_type {
                ResourceType::Video => Some(12.5),
                ResourceType::Image => None,
            },
            width: Some(640),
            height: Some(480),
        })
    }

    async fn destroy(
        &self,
        public_id: &str,
        _resource_type: ResourceType,
    ) -> Result<(), MediaError> {
        if self.fail_destroy.load(Ordering::Relaxed) {
            return Err(MediaError::Rejected("stubbed destroy failure".to_string()));
        }
        self.destroyed.lock().unwrap().push(public_id.to_string());
        Ok(())
    }
}

/// Identity provider fake backed by a map of provider-side records.
#[derive(Default)]
pub struct StubIdentityProvider {
    records: Mutex<HashMap<String, IdentitySnapshot>>,
}

impl StubIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, external_id: &str, email: &str, onboarding_complete: bool) {
        self.records.lock().unwrap().insert(
            external_id.to_string(),
            IdentitySnapshot {
                primary_email: email.to_string(),
                onboarding_complete,
            },
        );
    }

    pub fn onboarding_complete(&self, external_id: &str) -> bool {
        self.records
            .lock()
            .unwrap()
            .get(external_id)
            .map(|s| s.onboarding_complete)
            .unwrap_or(false)
    }
}

#[async_trait]
impl IdentityProvider for StubIdentityProvider {
    async fn fetch_user(&self, external_id: &str) -> Result<IdentitySnapshot, IdentityError> {
        self.records
            .lock()
            .unwrap()
            .get(external_id)
            .cloned()
            .ok_or_else(|| IdentityError::Rejected(format!("unknown user {}", external_id)))
    }

    async fn mark_onboarding_complete(&self, external_id: &str) -> Result<(), IdentityError> {
        let mut records = self.records.lock().unwrap();
        let entry = records
            .entry(external_id.to_string())
            .or_insert_with(|| IdentitySnapshot {
                primary_email: String::new(),
                onboarding_complete: false,
            });
        entry.onboarding_complete = true;
        Ok(())
    }
}
