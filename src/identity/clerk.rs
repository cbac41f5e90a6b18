use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::IdentityConfig;

use super::{IdentityError, IdentityProvider, IdentitySnapshot};

/// Clerk backend API client.
pub struct ClerkProvider {
    config: IdentityConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct EmailAddress {
    id: String,
    email_address: String,
}

#[derive(Debug, Deserialize)]
struct ClerkUser {
    #[serde(default)]
    email_addresses: Vec<EmailAddress>,
    primary_email_address_id: Option<String>,
    #[serde(default)]
    public_metadata: serde_json::Value,
}

impl ClerkProvider {
    pub fn new(config: IdentityConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn user_url(&self, external_id: &str) -> String {
        format!("{}/v1/users/{}", self.config.api_base, external_id)
    }
}

/// Primary email resolution: follow the declared primary pointer, fall back
/// to the first listed address if the pointer is stale.
fn primary_email(emails: &[EmailAddress], primary_id: Option<&str>) -> String {
    primary_id
        .and_then(|id| emails.iter().find(|e| e.id == id))
        .or_else(|| emails.first())
        .map(|e| e.email_address.clone())
        .unwrap_or_default()
}

#[async_trait]
impl IdentityProvider for ClerkProvider {
    async fn fetch_user(&self, external_id: &str) -> Result<IdentitySnapshot, IdentityError> {
        if self.config.secret_key.is_empty() {
            return Err(IdentityError::NotConfigured);
        }

        let response = self
            .client
            .get(self.user_url(external_id))
            .bearer_auth(&self.config.secret_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Rejected(format!("{}: {}", status, body)));
        }

        let user: ClerkUser = response.json().await?;
        let onboarding_complete = user
            .public_metadata
            .get("onboardingComplete")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        Ok(IdentitySnapshot {
            primary_email: primary_email(
                &user.email_addresses,
                user.primary_email_address_id.as_deref(),
            ),
            onboarding_complete,
        })
    }

    async fn mark_onboarding_complete(&self, external_id: &str) -> Result<(), IdentityError> {
        if self.config.secret_key.is_empty() {
            return Err(IdentityError::NotConfigured);
        }

        let response = self
            .client
            .patch(format!("{}/metadata", self.user_url(external_id)))
            .bearer_auth(&self.config.secret_key)
            .json(&json!({ "public_metadata": { "onboardingComplete": true } }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Rejected(format!("{}: {}", status, body)));
        }
        Ok(())
    }
}
