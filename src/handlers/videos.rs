use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config;
use crate::error::ApiError;
use crate::media::{ResourceType, UploadRequest};
use crate::middleware::AuthSession;
use crate::state::AppState;
use crate::store::models::{NewVideo, Video, VideoDto};

use super::read_upload_form;

#[derive(Debug, Deserialize)]
pub struct UpdateVideoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// GET /content/videos - list the caller's videos, newest first
pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
) -> Result<Json<Vec<VideoDto>>, ApiError> {
    let Some(user) = state.store.user_by_external_id(&session.external_id).await? else {
        // No mirror row yet means no uploads yet
        return Ok(Json(vec![]));
    };

    let videos = state.store.videos_for_owner(user.id).await?;
    Ok(Json(videos.into_iter().map(VideoDto::from).collect()))
}

/// POST /content/videos - upload a video, transcode it upstream, persist metadata
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    multipart: Multipart,
) -> Result<Json<VideoDto>, ApiError> {
    // The webhook creates the mirror row on sign-up; on the very first
    // sign-in it may not have landed yet. Retryable, not a content 404.
    let Some(user) = state.store.user_by_external_id(&session.external_id).await? else {
        return Err(ApiError::not_ready(
            "User account not ready. Please refresh and try again.",
        ));
    };

    let form = read_upload_form(multipart).await?;
    let Some(data) = form.file else {
        return Err(ApiError::bad_request("No file uploaded"));
    };
    let title = match form.title.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => return Err(ApiError::bad_request("Title is required")),
    };
    let description = match form.description.as_deref().map(str::trim) {
        Some(d) if !d.is_empty() => d.to_string(),
        _ => return Err(ApiError::bad_request("Description is required")),
    };
    let Some(original_size) = form.original_size else {
        return Err(ApiError::bad_request("Original size is required"));
    };

    let uploaded = state
        .media
        .upload(UploadRequest {
            data,
            resource_type: ResourceType::Video,
            folder: config::config().media.video_folder.clone(),
            // automatic quality/format optimization
            transformation: Some("q_auto,f_mp4".to_string()),
        })
        .await?;

    // Metadata write only after upload success; an upload failure above
    // leaves no partial record behind.
    let video = state
        .store
        .insert_video(NewVideo {
            title,
            description: Some(description),
            public_id: uploaded.public_id,
            original_size,
            compressed_size: uploaded.bytes.to_string(),
            duration: uploaded.duration.unwrap_or(0.0),
            owner_id: user.id,
        })
        .await?;

    Ok(Json(VideoDto::from(video)))
}

/// PATCH /content/videos/:id - owner-only title/description update
pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateVideoRequest>,
) -> Result<Json<VideoDto>, ApiError> {
    let title = match body.title.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => return Err(ApiError::bad_request("Title is required")),
    };

    let video = resolve_owned_video(&state, &session, id).await?;

    let updated = state
        .store
        .update_video(video.id, &title, body.description.as_deref())
        .await?;

    Ok(Json(VideoDto::from(updated)))
}

/// DELETE /content/videos/:id - owner-only; external binary goes first
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let video = resolve_owned_video(&state, &session, id).await?;

    // Destroy the external binary before the local row. If this fails we
    // abort with the row intact: a dangling metadata row is retryable,
    // an unreferenced external binary is not.
    state
        .media
        .destroy(&video.public_id, ResourceType::Video)
        .await
        .map_err(|e| {
            tracing::error!("Upstream video delete failed for {}: {}", video.public_id, e);
            ApiError::upstream_failure("Failed to delete video")
        })?;

    state.store.delete_video(video.id).await?;

    Ok(Json(json!({ "success": true })))
}

/// Ownership resolution: record by id, then the caller's mirror row, then
/// the owner comparison. A caller with no mirror row is "not the owner",
/// never "not found" - existence must not leak to non-owners.
async fn resolve_owned_video(
    state: &AppState,
    session: &AuthSession,
    id: Uuid,
) -> Result<Video, ApiError> {
    let video = state
        .store
        .video_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    let owner = state
        .store
        .user_by_external_id(&session.external_id)
        .await?;

    match owner {
        Some(user) if user.id == video.owner_id => Ok(video),
        _ => Err(ApiError::forbidden("Forbidden")),
    }
}
