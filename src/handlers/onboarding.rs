use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::AuthSession;
use crate::state::AppState;
use crate::store::StoreError;

#[derive(Debug, Deserialize)]
pub struct OnboardingRequest {
    #[serde(default)]
    pub username: String,
}

const USERNAME_RULE: &str =
    "Username must be 3-20 characters and contain only letters, numbers, or underscores";
const USERNAME_TAKEN: &str = "That username is already taken";

/// Letters, digits, underscores; 3 to 20 characters.
fn is_valid_username(username: &str) -> bool {
    (3..=20).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// PATCH /identity/onboarding - one-time username selection.
///
/// Upserts the caller's mirror row so onboarding still succeeds when the
/// identity webhook missed creating it, then sets the provider-side
/// completion flag so the gate's fast path passes once the session refreshes.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Json(body): Json<OnboardingRequest>,
) -> Result<Json<Value>, ApiError> {
    let username = body.username.trim();
    if username.is_empty() {
        return Err(ApiError::bad_request("Username is required"));
    }
    if !is_valid_username(username) {
        return Err(ApiError::bad_request(USERNAME_RULE));
    }

    // Friendly pre-check. The storage unique constraint is authoritative;
    // a race between this check and the write is handled below.
    if state.store.user_by_username(username).await?.is_some() {
        return Err(ApiError::bad_request(USERNAME_TAKEN));
    }

    // The email is only needed when the mirror row is missing, but fetching
    // it unconditionally keeps the upsert a single code path.
    let snapshot = state.identity.fetch_user(&session.external_id).await?;

    match state
        .store
        .set_username(&session.external_id, &snapshot.primary_email, username)
        .await
    {
        Ok(_) => {}
        // Pre-check/write race: map to the same "taken" message, never a 500
        Err(StoreError::Conflict(_)) => return Err(ApiError::bad_request(USERNAME_TAKEN)),
        Err(e) => return Err(e.into()),
    }

    state
        .identity
        .mark_onboarding_complete(&session.external_id)
        .await?;

    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_usernames() {
        for name in ["abc", "cool_creator_42", "A1_", "x".repeat(20).as_str()] {
            assert!(is_valid_username(name), "{name}");
        }
    }

    #[test]
    fn rejects_invalid_usernames() {
        for name in [
            "ab",                           // too short
            "this_is_way_too_long_12345",   // too long
            "bad name",                     // space
            "bad-name",                     // hyphen
            "émoji",                        // non-ascii
            "",
        ] {
            assert!(!is_valid_username(name), "{name}");
        }
    }
}
