//! Minimal page stand-ins. The dashboard UI is served elsewhere; these exist
//! so the onboarding gate has page navigation to classify and redirect.

use axum::Json;
use serde_json::{json, Value};

pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Media Vault API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "home": "/ (public)",
                "content": "/content/videos, /content/images (session required)",
                "onboarding": "/identity/onboarding (session required)",
                "webhook": "/identity/webhook (signature verified)",
            }
        }
    }))
}

pub async fn home() -> Json<Value> {
    Json(json!({ "page": "home" }))
}

pub async fn sign_in() -> Json<Value> {
    Json(json!({ "page": "sign-in" }))
}

pub async fn sign_up() -> Json<Value> {
    Json(json!({ "page": "sign-up" }))
}

pub async fn onboarding() -> Json<Value> {
    Json(json!({ "page": "onboarding" }))
}
