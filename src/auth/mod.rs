use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by a provider-issued session token.
///
/// `onboarding_complete` mirrors the provider-side flag and is only refreshed
/// when the token is reissued, so it can lag behind the authoritative record
/// for a short window after onboarding finishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// External identity-provider user id (e.g. "user_2abc...")
    pub sub: String,
    #[serde(default)]
    pub onboarding_complete: bool,
    pub exp: i64,
    pub iat: i64,
}

impl SessionClaims {
    pub fn new(external_id: impl Into<String>, onboarding_complete: bool) -> Self {
        let now = Utc::now();
        Self {
            sub: external_id.into(),
            onboarding_complete,
            exp: (now + Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session secret not configured")]
    MissingSecret,

    #[error("Invalid session token: {0}")]
    InvalidToken(String),

    #[error("Token generation error: {0}")]
    TokenGeneration(String),
}

/// Verify a session token and return its claims.
pub fn verify_session(token: &str, secret: &str) -> Result<SessionClaims, SessionError> {
    if secret.is_empty() {
        return Err(SessionError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<SessionClaims>(token, &decoding_key, &validation)
        .map_err(|e| SessionError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}

/// Mint a session token. In production the identity provider issues these;
/// this is used by local tooling and the test support module.
pub fn generate_session(claims: &SessionClaims, secret: &str) -> Result<String, SessionError> {
    if secret.is_empty() {
        return Err(SessionError::MissingSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| SessionError::TokenGeneration(e.to_string()))
}
