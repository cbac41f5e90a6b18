use std::sync::{Arc, Once};

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use mediavault::auth::{generate_session, SessionClaims};
use mediavault::state::AppState;
use mediavault::testing::{MemoryStore, StubIdentityProvider, StubMediaService};

pub const SESSION_SECRET: &str = "test-session-secret";
pub const WEBHOOK_SECRET: &str = "whsec_dGVzdC13ZWJob29rLXNlY3JldC1rZXk=";

static ENV: Once = Once::new();

/// The config singleton reads the environment once; pin the secrets before
/// anything touches it.
fn init_env() {
    ENV.call_once(|| {
        std::env::set_var("SESSION_JWT_SECRET", SESSION_SECRET);
        std::env::set_var("WEBHOOK_SIGNING_SECRET", WEBHOOK_SECRET);
    });
}

pub struct TestApp {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub media: Arc<StubMediaService>,
    pub identity: Arc<StubIdentityProvider>,
}

pub fn test_app() -> TestApp {
    init_env();

    let store = Arc::new(MemoryStore::new());
    let media = Arc::new(StubMediaService::new());
    let identity = Arc::new(StubIdentityProvider::new());

    let state = Arc::new(AppState {
        store: store.clone(),
        media: media.clone(),
        identity: identity.clone(),
    });

    TestApp {
        app: mediavault::app(state),
        store,
        media,
        identity,
    }
}

/// Mint a provider-style session token.
pub fn session_token(external_id: &str, onboarding_complete: bool) -> String {
    init_env();
    let claims = SessionClaims::new(external_id, onboarding_complete);
    generate_session(&claims, SESSION_SECRET).expect("mint session token")
}

pub async fn send(
    app: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    Ok((status, value))
}

const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

/// Build a multipart/form-data body with text fields and one binary file.
pub fn multipart_body(fields: &[(&str, &str)], file: Option<&[u8]>) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    if let Some(data) = file {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            b"Content-Disposition: form-data; name=\"file\"; filename=\"upload.bin\"\r\n",
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    (
        format!("multipart/form-data; boundary={}", BOUNDARY),
        body,
    )
}

pub async fn send_multipart(
    app: &Router,
    path: &str,
    token: &str,
    fields: &[(&str, &str)],
    file: Option<&[u8]>,
) -> Result<(StatusCode, Value)> {
    let (content_type, body) = multipart_body(fields, file);
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", content_type)
        .body(Body::from(body))?;

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Ok((status, value))
}
