//! Shared DTOs for JSON responses.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct MessageDto {
    pub message: String,
}

/// Multipart fields accepted by `POST /upload`.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<Vec<u8>>,
    pub anon_mask_file: Option<Vec<u8>>,
    pub overwrite: Option<String>,
}
