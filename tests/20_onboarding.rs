mod common;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use mediavault::state::AppState;
use mediavault::store::models::{Image, NewImage, NewVideo, User, Video};
use mediavault::store::{StoreError, VaultStore};
use mediavault::testing::{MemoryStore, StubIdentityProvider, StubMediaService};

#[tokio::test]
async fn requires_a_session() -> Result<()> {
    let ctx = common::test_app();

    let (status, _) = common::send(
        &ctx.app,
        "PATCH",
        "/identity/onboarding",
        None,
        Some(json!({ "username": "someone" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn rejects_invalid_usernames() -> Result<()> {
    let ctx = common::test_app();
    ctx.identity.put("user_a", "a@example.com", false);
    let token = common::session_token("user_a", false);

    for bad in ["ab", "this_is_way_too_long_12345", "bad name", ""] {
        let (status, body) = common::send(
            &ctx.app,
            "PATCH",
            "/identity/onboarding",
            Some(&token),
            Some(json!({ "username": bad })),
        )
        .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "username {bad:?}");
        assert_eq!(body["code"], json!("BAD_REQUEST"));
    }
    Ok(())
}

#[tokio::test]
async fn accepts_a_valid_username_and_marks_provider_flag() -> Result<()> {
    let ctx = common::test_app();
    ctx.store.upsert_user("user_a", "a@example.com").await?;
    ctx.identity.put("user_a", "a@example.com", false);
    let token = common::session_token("user_a", false);

    let (status, body) = common::send(
        &ctx.app,
        "PATCH",
        "/identity/onboarding",
        Some(&token),
        Some(json!({ "username": "cool_creator_42" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));

    let user = ctx.store.user_by_external_id("user_a").await?.unwrap();
    assert_eq!(user.username.as_deref(), Some("cool_creator_42"));
    assert!(ctx.identity.onboarding_complete("user_a"));
    Ok(())
}

#[tokio::test]
async fn creates_the_mirror_row_when_the_webhook_was_missed() -> Result<()> {
    let ctx = common::test_app();
    // No webhook-created row; the email comes from the provider instead.
    ctx.identity.put("user_late", "late@example.com", false);
    let token = common::session_token("user_late", false);

    let (status, _) = common::send(
        &ctx.app,
        "PATCH",
        "/identity/onboarding",
        Some(&token),
        Some(json!({ "username": "late_arrival" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let user = ctx.store.user_by_external_id("user_late").await?.unwrap();
    assert_eq!(user.email, "late@example.com");
    assert_eq!(user.username.as_deref(), Some("late_arrival"));
    Ok(())
}

#[tokio::test]
async fn taken_usernames_are_rejected_with_a_friendly_message() -> Result<()> {
    let ctx = common::test_app();
    ctx.store
        .set_username("user_a", "a@example.com", "taken_name")
        .await?;
    ctx.identity.put("user_b", "b@example.com", false);
    let token = common::session_token("user_b", false);

    let (status, body) = common::send(
        &ctx.app,
        "PATCH",
        "/identity/onboarding",
        Some(&token),
        Some(json!({ "username": "taken_name" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("That username is already taken"));
    Ok(())
}

/// Store whose username lookups always miss while writes still enforce the
/// unique constraint. Stands in for the window where another submission
/// commits between the handler's pre-check and its own write.
struct StaleLookupStore {
    inner: Arc<MemoryStore>,
}

#[async_trait]
impl VaultStore for StaleLookupStore {
    async fn user_by_username(&self, _username: &str) -> Result<Option<User>, StoreError> {
        Ok(None)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.inner.health_check().await
    }
    async fn upsert_user(&self, external_id: &str, email: &str) -> Result<User, StoreError> {
        self.inner.upsert_user(external_id, email).await
    }
    async fn user_by_external_id(&self, external_id: &str) -> Result<Option<User>, StoreError> {
        self.inner.user_by_external_id(external_id).await
    }
    async fn set_username(
        &self,
        external_id: &str,
        email: &str,
        username: &str,
    ) -> Result<User, StoreError> {
        self.inner.set_username(external_id, email, username).await
    }
    async fn delete_user(&self, external_id: &str) -> Result<bool, StoreError> {
        self.inner.delete_user(external_id).await
    }
    async fn insert_video(&self, video: NewVideo) -> Result<Video, StoreError> {
        self.inner.insert_video(video).await
    }
    async fn video_by_id(&self, id: Uuid) -> Result<Option<Video>, StoreError> {
        self.inner.video_by_id(id).await
    }
    async fn videos_for_owner(&self, owner_id: Uuid) -> Result<Vec<Video>, StoreError> {
        self.inner.videos_for_owner(owner_id).await
    }
    async fn update_video(
        &self,
        id: Uuid,
        title: &str,
        description: Option<&str>,
    ) -> Result<Video, StoreError> {
        self.inner.update_video(id, title, description).await
    }
    async fn delete_video(&self, id: Uuid) -> Result<bool, StoreError> {
        self.inner.delete_video(id).await
    }
    async fn insert_image(&self, image: NewImage) -> Result<Image, StoreError> {
        self.inner.insert_image(image).await
    }
    async fn image_by_id(&self, id: Uuid) -> Result<Option<Image>, StoreError> {
        self.inner.image_by_id(id).await
    }
    async fn images_for_owner(&self, owner_id: Uuid) -> Result<Vec<Image>, StoreError> {
        self.inner.images_for_owner(owner_id).await
    }
    async fn update_image(&self, id: Uuid, title: &str) -> Result<Image, StoreError> {
        self.inner.update_image(id, title).await
    }
    async fn delete_image(&self, id: Uuid) -> Result<bool, StoreError> {
        self.inner.delete_image(id).await
    }
}

#[tokio::test]
async fn username_race_maps_constraint_violation_to_taken() -> Result<()> {
    // The blinded lookup forces the handler past its friendly pre-check, so
    // the write itself hits the unique constraint and the conflict mapping
    // is what produces the response.
    let store = Arc::new(MemoryStore::new());
    let identity = Arc::new(StubIdentityProvider::new());
    identity.put("user_a", "a@example.com", false);
    identity.put("user_b", "b@example.com", false);
    store
        .set_username("user_a", "a@example.com", "contested")
        .await?;

    let state = Arc::new(AppState {
        store: Arc::new(StaleLookupStore {
            inner: store.clone(),
        }),
        media: Arc::new(StubMediaService::new()),
        identity: identity.clone(),
    });
    let app = mediavault::app(state);

    let token = common::session_token("user_b", false);
    let (status, body) = common::send(
        &app,
        "PATCH",
        "/identity/onboarding",
        Some(&token),
        Some(json!({ "username": "contested" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("That username is already taken"));

    // The loser's submission must not have stolen the name
    let winner = store.user_by_external_id("user_a").await?.unwrap();
    assert_eq!(winner.username.as_deref(), Some("contested"));
    assert!(store.user_by_external_id("user_b").await?.map_or(true, |u| u.username.is_none()));
    Ok(())
}

#[tokio::test]
async fn concurrent_submissions_yield_one_winner() -> Result<()> {
    let ctx = common::test_app();
    ctx.identity.put("user_a", "a@example.com", false);
    ctx.identity.put("user_b", "b@example.com", false);

    let token_a = common::session_token("user_a", false);
    let token_b = common::session_token("user_b", false);
    let body = json!({ "username": "only_one" });

    let (res_a, res_b) = tokio::join!(
        common::send(&ctx.app, "PATCH", "/identity/onboarding", Some(&token_a), Some(body.clone())),
        common::send(&ctx.app, "PATCH", "/identity/onboarding", Some(&token_b), Some(body.clone())),
    );
    let (status_a, body_a) = res_a?;
    let (status_b, body_b) = res_b?;

    let outcomes = [(status_a, body_a), (status_b, body_b)];
    let winners = outcomes
        .iter()
        .filter(|(s, _)| *s == StatusCode::OK)
        .count();
    assert_eq!(winners, 1, "exactly one submission must win: {outcomes:?}");

    let loser = outcomes
        .iter()
        .find(|(s, _)| *s != StatusCode::OK)
        .unwrap();
    assert_eq!(loser.0, StatusCode::BAD_REQUEST);
    assert_eq!(loser.1["message"], json!("That username is already taken"));
    Ok(())
}
