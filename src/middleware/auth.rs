use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{self, SessionClaims};
use crate::config;
use crate::error::ApiError;

/// Authenticated caller context extracted from a verified session token
#[derive(Clone, Debug)]
pub struct AuthSession {
    /// External identity-provider user id
    pub external_id: String,
    /// Session-claim copy of the onboarding flag; may lag the provider
    pub onboarding_complete: bool,
}

impl From<SessionClaims> for AuthSession {
    fn from(claims: SessionClaims) -> Self {
        Self {
            external_id: claims.sub,
            onboarding_complete: claims.onboarding_complete,
        }
    }
}

/// Session middleware for the JSON API: validates the Bearer token and
/// injects the caller context, answering 401 otherwise.
pub async fn require_session(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers).map_err(ApiError::unauthorized)?;

    let claims = auth::verify_session(&token, &config::config().security.session_jwt_secret)
        .map_err(|e| ApiError::unauthorized(e.to_string()))?;

    request.extensions_mut().insert(AuthSession::from(claims));

    Ok(next.run(request).await)
}

/// Extract the session token from the Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty session token".to_string());
        }
        Ok(token.to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
