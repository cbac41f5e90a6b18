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
use crate::store::models::{Image, ImageDto, NewImage};

use super::read_upload_form;

#[derive(Debug, Deserialize)]
pub struct UpdateImageRequest {
    pub title: Option<String>,
}

/// GET /content/images - list the caller's images, newest first
pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
) -> Result<Json<Vec<ImageDto>>, ApiError> {
    let Some(user) = state.store.user_by_external_id(&session.external_id).await? else {
        return Ok(Json(vec![]));
    };

    let images = state.store.images_for_owner(user.id).await?;
    Ok(Json(images.into_iter().map(ImageDto::from).collect()))
}

/// POST /content/images - upload an image and persist metadata
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let Some(user) = state.store.user_by_external_id(&session.external_id).await? else {
        return Err(ApiError::not_ready(
            "User account not ready. Please refresh and try again.",
        ));
    };

    let form = read_upload_form(multipart).await?;
    let Some(data) = form.file else {
        return Err(ApiError::bad_request("No file uploaded"));
    };
    let title = form
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("Untitled")
        .to_string();

    let uploaded = state
        .media
        .upload(UploadRequest {
            data,
            resource_type: ResourceType::Image,
            folder: config::config().media.image_folder.clone(),
            transformation: None,
        })
        .await?;

    state
        .store
        .insert_image(NewImage {
            title,
            public_id: uploaded.public_id.clone(),
            width: uploaded.width.unwrap_or(0),
            height: uploaded.height.unwrap_or(0),
            owner_id: user.id,
        })
        .await?;

    Ok(Json(json!({ "publicId": uploaded.public_id })))
}

/// PATCH /content/images/:id - owner-only title update
pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateImageRequest>,
) -> Result<Json<ImageDto>, ApiError> {
    let title = match body.title.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => return Err(ApiError::bad_request("Title is required")),
    };

    let image = resolve_owned_image(&state, &session, id).await?;

    let updated = state.store.update_image(image.id, &title).await?;
    Ok(Json(ImageDto::from(updated)))
}

/// DELETE /content/images/:id - owner-only; external binary goes first
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let image = resolve_owned_image(&state, &session, id).await?;

    state
        .media
        .destroy(&image.public_id, ResourceType::Image)
        .await
        .map_err(|e| {
            tracing::error!("Upstream image delete failed for {}: {}", image.public_id, e);
            ApiError::upstream_failure("Failed to delete image")
        })?;

    state.store.delete_image(image.id).await?;

    Ok(Json(json!({ "success": true })))
}

/// Same resolution order as videos: record, caller identity, owner check.
async fn resolve_owned_image(
    state: &AppState,
    session: &AuthSession,
    id: Uuid,
) -> Result<Image, ApiError> {
    let image = state
        .store
        .image_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Image not found"))?;

    let owner = state
        .store
        .user_by_external_id(&session.external_id)
        .await?;

    match owner {
        Some(user) if user.id == image.owner_id => Ok(image),
        _ => Err(ApiError::forbidden("Forbidden")),
    }
}
