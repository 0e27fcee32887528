use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Body of `POST /generate-text`.
#[derive(Debug, Deserialize)]
pub struct GenerateTextRequest {
    pub prompt: String,
}

/// Successful generation response.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationResponse {
    pub result: String,
}

/// MIME type assumed when the client sends a file part without one, the
/// same default multipart parsers report for an untyped part.
pub const DEFAULT_MIME_TYPE: &str = "text/plain";

/// A file read from a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub mime_type: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(mime_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }
}
