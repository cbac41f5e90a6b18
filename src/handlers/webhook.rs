use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config;
use crate::error::ApiError;
use crate::state::AppState;
use crate::webhook::{IdentityEvent, UserDeletedData, UserUpsertData, WebhookVerifier};

/// POST /identity/webhook - identity lifecycle sync.
///
/// Body arrives as raw bytes: the signature covers the exact transmitted
/// byte sequence and must be verified before any deserialization.
pub async fn receive(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let (msg_id, timestamp, signature) = signature_headers(&headers)?;

    let security = &config::config().security;
    let verifier = WebhookVerifier::new(
        &security.webhook_signing_secret,
        security.webhook_tolerance_secs,
    )
    .map_err(|e| {
        tracing::error!("Webhook verifier setup failed: {}", e);
        ApiError::internal_server_error("Webhook secret not configured")
    })?;

    verifier
        .verify(msg_id, timestamp, signature, &body)
        .map_err(|e| {
            warn!("Webhook signature verification failed: {}", e);
            ApiError::unauthorized("Invalid signature")
        })?;

    // Only now is the payload trusted enough to parse.
    let event: IdentityEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Malformed event payload: {}", e)))?;

    match event.kind.as_str() {
        "user.created" | "user.updated" => {
            let data: UserUpsertData = serde_json::from_value(event.data)
                .map_err(|e| ApiError::bad_request(format!("Malformed event data: {}", e)))?;
            let email = data.primary_email();
            state.store.upsert_user(&data.id, &email).await?;
            info!("[webhook] {} -> mirror row upserted for {}", event.kind, data.id);
        }
        "user.deleted" => {
            let data: UserDeletedData = serde_json::from_value(event.data)
                .map_err(|e| ApiError::bad_request(format!("Malformed event data: {}", e)))?;
            // Only act when the provider explicitly confirms deletion. A
            // RESTRICT violation (content still attributed) surfaces as 500
            // rather than cascading away ownership history.
            match data.id {
                Some(id) if data.deleted => {
                    state.store.delete_user(&id).await?;
                    info!("[webhook] user.deleted -> mirror row removed for {}", id);
                }
                _ => {}
            }
        }
        other => {
            // Acknowledge events this system doesn't care about so the
            // provider doesn't retry them.
            info!("[webhook] unhandled event type: {}", other);
        }
    }

    Ok(Json(json!({ "received": true })))
}

/// All three signature headers must be present.
fn signature_headers(headers: &HeaderMap) -> Result<(&str, &str, &str), ApiError> {
    let get = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::bad_request("Missing svix signature headers"))
    };
    Ok((get("svix-id")?, get("svix-timestamp")?, get("svix-signature")?))
}
