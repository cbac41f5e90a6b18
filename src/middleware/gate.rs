//! Onboarding gate.
//!
//! Every request is classified into exactly one of three states and either
//! passes through or is redirected. The gate holds no state of its own: it
//! reads the session claims and, on the slow path, the identity provider.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::auth::{self, SessionClaims};
use crate::config;
use crate::error::ApiError;
use crate::middleware::auth::extract_bearer_token;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    AuthenticatedNoUsername,
    AuthenticatedOnboarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    RedirectHome,
    RedirectSignIn,
    /// Session claims say onboarding is incomplete, but they may be stale;
    /// the authoritative provider record decides.
    CheckAuthoritative,
}

/// Fully public: no session required at all. The webhook performs its own
/// signature verification and must never be subject to session auth.
fn is_public(path: &str) -> bool {
    path == "/"
        || path == "/health"
        || path.starts_with("/sign-in")
        || path.starts_with("/sign-up")
        || path == "/identity/webhook"
}

fn is_auth_page(path: &str) -> bool {
    path.starts_with("/sign-in") || path.starts_with("/sign-up")
}

/// Reachable while authenticated but not yet onboarded. Both the page and
/// its submission endpoint must be listed, or the submission itself gets
/// bounced back to the onboarding page.
fn is_onboarding_route(path: &str) -> bool {
    path == "/onboarding" || path == "/identity/onboarding"
}

/// JSON API routes are never redirected. Without a session their own
/// middleware answers 401; an authenticated caller with unfinished
/// onboarding gets a 403 from the gate instead of a redirect.
fn is_api(path: &str) -> bool {
    path.starts_with("/content") || path.starts_with("/identity")
}

/// Per-request classification. Pure so the transition table is testable.
pub fn classify(path: &str, session: Option<&SessionClaims>) -> GateDecision {
    // Signed-in users have no business on the auth pages
    if session.is_some() && is_auth_page(path) {
        return GateDecision::RedirectHome;
    }

    if is_public(path) {
        return GateDecision::Allow;
    }

    let Some(claims) = session else {
        if is_api(path) {
            // let the API's own session middleware answer 401
            return GateDecision::Allow;
        }
        return GateDecision::RedirectSignIn;
    };

    // The onboarding page itself must stay reachable, or the redirect loops
    if is_onboarding_route(path) {
        return GateDecision::Allow;
    }

    // Fast path: the embedded claim already asserts completion
    if claims.onboarding_complete {
        return GateDecision::Allow;
    }

    GateDecision::CheckAuthoritative
}

pub fn session_state(session: Option<&SessionClaims>) -> SessionState {
    match session {
        None => SessionState::Unauthenticated,
        Some(c) if c.onboarding_complete => SessionState::AuthenticatedOnboarded,
        Some(_) => SessionState::AuthenticatedNoUsername,
    }
}

/// Gate middleware. Applied outermost so every route is classified.
pub async fn onboarding_gate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    // A missing or invalid token is simply "no session" here; protected
    // routes reject it downstream.
    let session = extract_bearer_token(&headers)
        .ok()
        .and_then(|token| {
            auth::verify_session(&token, &config::config().security.session_jwt_secret).ok()
        });

    match classify(&path, session.as_ref()) {
        GateDecision::Allow => next.run(request).await,
        GateDecision::RedirectHome => Redirect::temporary("/home").into_response(),
        GateDecision::RedirectSignIn => Redirect::temporary("/sign-in").into_response(),
        GateDecision::CheckAuthoritative => {
            // Slow path: the claim says incomplete but is refreshed only
            // periodically. Right after onboarding finishes, the provider
            // record already reads complete while the claim still lags, so
            // the authoritative lookup decides. Taken at most once per user,
            // during the staleness window.
            let Some(claims) = session else {
                return Redirect::temporary("/sign-in").into_response();
            };
            match state.identity.fetch_user(&claims.sub).await {
                Ok(snapshot) if snapshot.onboarding_complete => next.run(request).await,
                Ok(_) => deny_not_onboarded(&path),
                Err(e) => {
                    // Fail toward the claim: the user re-lands on onboarding
                    tracing::error!("Authoritative onboarding lookup failed: {}", e);
                    deny_not_onboarded(&path)
                }
            }
        }
    }
}

/// Unfinished onboarding: page navigation is redirected, API calls answer
/// with a JSON 403 a client can act on.
fn deny_not_onboarded(path: &str) -> Response {
    if is_api(path) {
        ApiError::forbidden("Onboarding required").into_response()
    } else {
        Redirect::temporary("/onboarding").into_response()
    }
}
