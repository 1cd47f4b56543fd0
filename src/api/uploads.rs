//! Upload-receiving boundary
//!
//! Parses a multipart request into plain text fields plus an [`UploadSet`]
//! of staged temp files. Everything past this boundary deals only in
//! `TempUpload` handles; nothing else in the crate touches multipart.

use crate::error::{ApiError, ApiResult};
use crate::models::{TempUpload, UploadSet};
use crate::services::MediaStore;
use axum::extract::multipart::{Field, Multipart};
use std::collections::HashMap;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Wire field name for the ordered image set
pub const IMAGE_FIELD: &str = "images";
/// Wire field name for the single attached document
pub const DOCUMENT_FIELD: &str = "pdf";
/// Images accepted per request
pub const MAX_IMAGES: usize = 25;
/// Request body cap (all parts together)
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

const ALLOWED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];
const ALLOWED_DOCUMENT_TYPES: [&str; 1] = ["application/pdf"];

/// A fully read multipart form: text fields plus staged files
#[derive(Debug, Default)]
pub struct ParsedForm {
    pub fields: HashMap<String, String>,
    pub files: UploadSet,
}

/// Read every part of a multipart request
///
/// File parts under the two known field names are streamed to temp files;
/// everything else is collected as text.
pub async fn read_form(mut multipart: Multipart, store: &MediaStore) -> ApiResult<ParsedForm> {
    let mut form = ParsedForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart request: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            IMAGE_FIELD => {
                if form.files.images.len() >= MAX_IMAGES {
                    return Err(ApiError::BadRequest(format!(
                        "At most {} images per request",
                        MAX_IMAGES
                    )));
                }
                if let Some(upload) = stage_file(field, store, &ALLOWED_IMAGE_TYPES).await? {
                    form.files.images.push(upload);
                }
            }
            DOCUMENT_FIELD => {
                if form.files.document.is_some() {
                    return Err(ApiError::BadRequest(
                        "At most one document per request".to_string(),
                    ));
                }
                form.files.document = stage_file(field, store, &ALLOWED_DOCUMENT_TYPES).await?;
            }
            _ => {
                let text = field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Unreadable form field '{}': {}", name, e))
                })?;
                form.fields.insert(name, text);
            }
        }
    }

    debug!(
        "Parsed form: {} text field(s), {} image(s), document: {}",
        form.fields.len(),
        form.files.images.len(),
        form.files.document.is_some()
    );
    Ok(form)
}

/// Stream one file part into the temp staging area
///
/// A part with no filename (an empty file input) is skipped rather than
/// rejected. Unsupported content types are a client error.
async fn stage_file(
    mut field: Field<'_>,
    store: &MediaStore,
    allowed_types: &[&str],
) -> ApiResult<Option<TempUpload>> {
    let original_name = match field.file_name() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return Ok(None),
    };

    let content_type = field.content_type().unwrap_or_default().to_string();
    if !allowed_types.contains(&content_type.as_str()) {
        return Err(ApiError::BadRequest(format!(
            "Unsupported file type '{}' for {}",
            content_type, original_name
        )));
    }

    let temp_path = store.tmp_dir().join(uuid::Uuid::new_v4().to_string());
    let mut out = tokio::fs::File::create(&temp_path)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to stage upload: {}", e)))?;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Upload interrupted: {}", e)))?
    {
        out.write_all(&chunk)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to stage upload: {}", e)))?;
    }
    out.flush()
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to stage upload: {}", e)))?;

    Ok(Some(TempUpload {
        original_name,
        temp_path,
    }))
}
