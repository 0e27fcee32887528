use crate::dtos::{UploadedFile, DEFAULT_MIME_TYPE};
use axum::extract::Multipart;
use service_core::error::AppError;
use std::collections::HashMap;

/// All parts of a multipart form, keyed by field name.
///
/// A repeated field name keeps its last occurrence; unnamed parts are dropped.
#[derive(Debug, Default)]
pub struct UploadForm {
    files: HashMap<String, UploadedFile>,
    texts: HashMap<String, String>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            AppError::BadRequest(anyhow::anyhow!("Failed to read multipart field: {}", e))
        })? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let file_name = field.file_name().map(str::to_string);
            let mime_type = field
                .content_type()
                .unwrap_or(DEFAULT_MIME_TYPE)
                .to_string();

            let bytes = field.bytes().await.map_err(|e| {
                AppError::BadRequest(anyhow::anyhow!("Failed to read field '{}': {}", name, e))
            })?;

            match file_name {
                Some(file_name) => {
                    tracing::debug!(
                        field = %name,
                        file_name = %file_name,
                        mime_type = %mime_type,
                        size = bytes.len(),
                        "Received upload"
                    );
                    form.files.insert(name, UploadedFile { mime_type, bytes });
                }
                None => {
                    form.texts
                        .insert(name, String::from_utf8_lossy(&bytes).into_owned());
                }
            }
        }

        Ok(form)
    }

    /// Remove a required file field, or fail with 400.
    pub fn take_file(&mut self, name: &str) -> Result<UploadedFile, AppError> {
        self.files.remove(name).ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!("Missing file field '{}'", name))
        })
    }

    /// Remove an optional text field.
    pub fn take_text(&mut self, name: &str) -> Option<String> {
        self.texts.remove(name)
    }
}
