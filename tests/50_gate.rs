mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::json;
use tower::ServiceExt;

use mediavault::store::VaultStore;

async fn get(app: &Router, path: &str, token: Option<&str>) -> Result<(StatusCode, Option<String>)> {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let response = app.clone().oneshot(builder.body(Body::empty())?).await?;
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Ok((response.status(), location))
}

#[tokio::test]
async fn public_routes_pass_without_a_session() -> Result<()> {
    let ctx = common::test_app();
    for path in ["/", "/health", "/sign-in", "/sign-up"] {
        let (status, _) = get(&ctx.app, path, None).await?;
        assert_eq!(status, StatusCode::OK, "{path}");
    }
    Ok(())
}

#[tokio::test]
async fn unauthenticated_page_requests_redirect_to_sign_in() -> Result<()> {
    let ctx = common::test_app();
    let (status, location) = get(&ctx.app, "/home", None).await?;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location.as_deref(), Some("/sign-in"));
    Ok(())
}

#[tokio::test]
async fn signed_in_users_are_sent_away_from_auth_pages() -> Result<()> {
    let ctx = common::test_app();
    let token = common::session_token("user_a", true);
    let (status, location) = get(&ctx.app, "/sign-in", Some(&token)).await?;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location.as_deref(), Some("/home"));
    Ok(())
}

#[tokio::test]
async fn onboarded_claims_take_the_fast_path() -> Result<()> {
    let ctx = common::test_app();
    let token = common::session_token("user_a", true);
    let (status, _) = get(&ctx.app, "/home", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn stale_claims_are_overridden_by_the_authoritative_record() -> Result<()> {
    let ctx = common::test_app();
    // The just-onboarded case: session claim still reads incomplete, but
    // the provider backend already reads complete.
    ctx.identity.put("user_a", "a@example.com", true);
    let token = common::session_token("user_a", false);

    let (status, _) = get(&ctx.app, "/home", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn not_onboarded_users_are_redirected_to_onboarding() -> Result<()> {
    let ctx = common::test_app();
    ctx.identity.put("user_a", "a@example.com", false);
    let token = common::session_token("user_a", false);

    let (status, location) = get(&ctx.app, "/home", Some(&token)).await?;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location.as_deref(), Some("/onboarding"));
    Ok(())
}

#[tokio::test]
async fn the_onboarding_page_never_redirect_loops() -> Result<()> {
    let ctx = common::test_app();
    ctx.identity.put("user_a", "a@example.com", false);
    let token = common::session_token("user_a", false);

    let (status, _) = get(&ctx.app, "/onboarding", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn the_webhook_is_never_session_gated() -> Result<()> {
    let ctx = common::test_app();
    // No session, no redirect: the handler's own header check answers.
    let request = Request::builder()
        .method("POST")
        .uri("/identity/webhook")
        .body(Body::empty())?;
    let response = ctx.app.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn api_routes_answer_401_instead_of_redirecting() -> Result<()> {
    let ctx = common::test_app();
    let (status, location) = get(&ctx.app, "/content/videos", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(location, None);
    Ok(())
}

#[tokio::test]
async fn unonboarded_sessions_get_403_on_content_apis() -> Result<()> {
    let ctx = common::test_app();
    ctx.identity.put("user_a", "a@example.com", false);
    let token = common::session_token("user_a", false);

    let (status, location) = get(&ctx.app, "/content/videos", Some(&token)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(location, None);
    Ok(())
}

#[tokio::test]
async fn unonboarded_uploads_are_blocked_before_the_handler() -> Result<()> {
    let ctx = common::test_app();
    // Mirror row exists, so only the gate stands between this caller and
    // a successful upload.
    let user = ctx.store.upsert_user("user_a", "a@example.com").await?;
    ctx.identity.put("user_a", "a@example.com", false);
    let token = common::session_token("user_a", false);

    let (status, body) = common::send_multipart(
        &ctx.app,
        "/content/videos",
        &token,
        &[("title", "clip"), ("description", "d"), ("originalSize", "1")],
        Some(b"bytes"),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], json!("FORBIDDEN"));
    assert_eq!(ctx.store.videos_for_owner(user.id).await?.len(), 0);
    Ok(())
}

#[tokio::test]
async fn stale_claims_still_reach_content_apis_via_the_slow_path() -> Result<()> {
    let ctx = common::test_app();
    ctx.identity.put("user_a", "a@example.com", true);
    let token = common::session_token("user_a", false);

    let (status, _) = get(&ctx.app, "/content/videos", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn an_invalid_token_counts_as_no_session() -> Result<()> {
    let ctx = common::test_app();
    let (status, location) = get(&ctx.app, "/home", Some("not.a.jwt")).await?;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location.as_deref(), Some("/sign-in"));
    Ok(())
}
