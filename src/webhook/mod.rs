//! Identity webhook signature verification and event payloads.
//!
//! The provider signs every delivery with an HMAC over the exact transmitted
//! bytes. Verification therefore runs on the raw body before any JSON
//! parsing; re-serialization is not guaranteed to be byte-identical.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Webhook signing secret not configured")]
    MissingSecret,

    #[error("Malformed signing secret")]
    MalformedSecret,

    #[error("Timestamp outside tolerance")]
    TimestampOutOfTolerance,

    #[error("Malformed timestamp header")]
    MalformedTimestamp,

    #[error("Signature mismatch")]
    SignatureMismatch,
}

/// Verifier for svix-style webhook signatures.
///
/// The signed content is `{msg_id}.{timestamp}.{raw_body}`; the expected
/// signature is the base64 HMAC-SHA256 under the shared secret. The signature
/// header may carry several space-separated `v1,<base64>` entries (key
/// rotation); any one matching is sufficient.
pub struct WebhookVerifier {
    key: Vec<u8>,
    tolerance_secs: i64,
}

impl WebhookVerifier {
    pub fn new(secret: &str, tolerance_secs: i64) -> Result<Self, WebhookError> {
        if secret.is_empty() {
            return Err(WebhookError::MissingSecret);
        }
        // Secrets are distributed as "whsec_" + base64 key.
        let encoded = secret.strip_prefix("whsec_").unwrap_or(secret);
        let key = BASE64
            .decode(encoded)
            .map_err(|_| WebhookError::MalformedSecret)?;
        Ok(Self {
            key,
            tolerance_secs,
        })
    }

    /// Verify a delivery against its three signature headers.
    pub fn verify(
        &self,
        msg_id: &str,
        timestamp: &str,
        signature_header: &str,
        raw_body: &[u8],
    ) -> Result<(), WebhookError> {
        let ts: i64 = timestamp
            .parse()
            .map_err(|_| WebhookError::MalformedTimestamp)?;
        let now = Utc::now().timestamp();
        if (now - ts).abs() > self.tolerance_secs {
            return Err(WebhookError::TimestampOutOfTolerance);
        }

        for candidate in signature_header.split_whitespace() {
            let Some(encoded) = candidate.strip_prefix("v1,") else {
                continue;
            };
            let Ok(signature) = BASE64.decode(encoded) else {
                continue;
            };

            let mut mac =
                HmacSha256::new_from_slice(&self.key).map_err(|_| WebhookError::MalformedSecret)?;
            mac.update(msg_id.as_bytes());
            mac.update(b".");
            mac.update(timestamp.as_bytes());
            mac.update(b".");
            mac.update(raw_body);
            // Constant-time comparison
            if mac.verify_slice(&signature).is_ok() {
                return Ok(());
            }
        }

        Err(WebhookError::SignatureMismatch)
    }

    /// Produce a `v1,<base64>` signature for a body. Used by local tooling
    /// and tests to build valid deliveries.
    pub fn sign(&self, msg_id: &str, timestamp: &str, raw_body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("hmac accepts any key length");
        mac.update(msg_id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(raw_body);
        format!("v1,{}", BASE64.encode(mac.finalize().into_bytes()))
    }
}

// ---------------------------------------------------------------------------
// Event payloads. Untrusted until the signature check above has passed.
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct IdentityEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct EventEmailAddress {
    pub id: String,
    pub email_address: String,
}

/// Payload shape shared by `user.created` and `user.updated`.
#[derive(Debug, Deserialize)]
pub struct UserUpsertData {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<EventEmailAddress>,
    pub primary_email_address_id: Option<String>,
}

impl UserUpsertData {
    /// Primary email with fallback to the first listed address if the
    /// declared pointer is stale.
    pub fn primary_email(&self) -> String {
        self.primary_email_address_id
            .as_deref()
            .and_then(|id| self.email_addresses.iter().find(|e| e.id == id))
            .or_else(|| self.email_addresses.first())
            .map(|e| e.email_address.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub struct UserDeletedData {
    pub id: Option<String>,
    #[serde(default)]
    pub deleted: bool,
}
