mod clerk;

pub use clerk::ClerkProvider;

use async_trait::async_trait;
use thiserror::Error;

/// Authoritative view of a provider-side identity, fetched directly from the
/// provider's backend API (as opposed to the stale claims embedded in a
/// session token).
#[derive(Debug, Clone)]
pub struct IdentitySnapshot {
    pub primary_email: String,
    pub onboarding_complete: bool,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Identity provider credentials not configured")]
    NotConfigured,

    #[error("Identity provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Identity provider rejected the request: {0}")]
    Rejected(String),
}

/// Backend access to the external identity provider. Used on the onboarding
/// slow path and when the webhook missed creating a mirror row.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn fetch_user(&self, external_id: &str) -> Result<IdentitySnapshot, IdentityError>;
    /// Set the provider-side "onboarding complete" flag so refreshed session
    /// tokens carry it.
    async fn mark_onboarding_complete(&self, external_id: &str) -> Result<(), IdentityError>;
}
