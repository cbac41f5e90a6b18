use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::config::MediaConfig;

use super::{MediaError, MediaService, MediaUpload, ResourceType, UploadRequest};

/// Cloudinary REST client using signed uploads.
///
/// Signature scheme: the request parameters (everything except `file`,
/// `api_key` and the signature itself) are sorted by key, joined as
/// `k=v&k=v`, the API secret is appended, and the whole string is hashed.
/// We request SHA-256 via `signature_algorithm`.
pub struct CloudinaryService {
    config: MediaConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    bytes: i64,
    duration: Option<f64>,
    width: Option<i32>,
    height: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryService {
    pub fn new(config: MediaConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, resource_type: ResourceType, action: &str) -> String {
        format!(
            "{}/v1_1/{}/{}/{}",
            self.config.api_base,
            self.config.cloud_name,
            resource_type.as_str(),
            action
        )
    }

    /// Sign `params` (already sorted by key) with the API secret.
    fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
        let to_sign = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl MediaService for CloudinaryService {
    async fn upload(&self, request: UploadRequest) -> Result<MediaUpload, MediaError> {
        if !self.config.is_configured() {
            return Err(MediaError::NotConfigured);
        }

        let timestamp = Utc::now().timestamp().to_string();

        // Parameters included in the signature, sorted by key.
        let mut signed: Vec<(&str, &str)> = vec![("folder", request.folder.as_str())];
        if let Some(t) = request.transformation.as_deref() {
            signed.push(("transformation", t));
        }
        signed.push(("signature_algorithm", "sha256"));
        signed.push(("timestamp", timestamp.as_str()));
        signed.sort_by_key(|(k, _)| *k);
        let signature = Self::sign(&signed, &self.config.api_secret);

        let mut form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(request.data))
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", request.folder.clone())
            .text("signature_algorithm", "sha256")
            .text("signature", signature);
        if let Some(t) = request.transformation {
            form = form.text("transformation", t);
        }

        let response = self
            .client
            .post(self.endpoint(request.resource_type, "upload"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Rejected(format!("{}: {}", status, body)));
        }

        let result: UploadResponse = response.json().await?;
        Ok(MediaUpload {
            public_id: result.public_id,
            bytes: result.bytes,
            duration: result.duration,
            width: result.width,
            height: result.height,
        })
    }

    async fn destroy(
        &self,
        public_id: &str,
        resource_type: ResourceType,
    ) -> Result<(), MediaError> {
        if !self.config.is_configured() {
            return Err(MediaError::NotConfigured);
        }

        let timestamp = Utc::now().timestamp().to_string();
        let mut signed: Vec<(&str, &str)> = vec![
            ("public_id", public_id),
            ("signature_algorithm", "sha256"),
            ("timestamp", timestamp.as_str()),
        ];
        signed.sort_by_key(|(k, _)| *k);
        let signature = Self::sign(&signed, &self.config.api_secret);

        let form = reqwest::multipart::Form::new()
            .text("public_id", public_id.to_string())
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        let response = self
            .client
            .post(self.endpoint(resource_type, "destroy"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Rejected(format!("{}: {}", status, body)));
        }

        let result: DestroyResponse = response.json().await?;
        // "not found" is acceptable on destroy: the binary is already gone.
        if result.result != "ok" && result.result != "not found" {
            return Err(MediaError::Rejected(result.result));
        }
        Ok(())
    }
}
