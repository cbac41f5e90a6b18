pub mod images;
pub mod onboarding;
pub mod pages;
pub mod videos;
pub mod webhook;

use axum::extract::Multipart;

use crate::error::ApiError;

/// Collected multipart fields for an upload request. Exactly one binary file
/// plus descriptive text fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<Vec<u8>>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub original_size: Option<String>,
}

/// Drain a multipart payload into an `UploadForm`. Unknown fields are
/// ignored.
pub async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart payload: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?;
                form.file = Some(data.to_vec());
            }
            "title" => form.title = field.text().await.ok(),
            "description" => form.description = field.text().await.ok(),
            "originalSize" => form.original_size = field.text().await.ok(),
            _ => {}
        }
    }

    Ok(form)
}
