//! Uploaded file handles
//!
//! The upload boundary (api/uploads.rs) streams each accepted multipart
//! part to a temp file and hands the rest of the pipeline these handles.

use std::path::PathBuf;

/// One uploaded file, staged in the temp directory
#[derive(Debug, Clone)]
pub struct TempUpload {
    /// Filename as supplied by the client
    pub original_name: String,
    /// Where the bytes were staged
    pub temp_path: PathBuf,
}

/// The files attached to one create/update request
#[derive(Debug, Clone, Default)]
pub struct UploadSet {
    /// New listing photos, in the client's selection order
    pub images: Vec<TempUpload>,
    /// New attached document (brochure), at most one
    pub document: Option<TempUpload>,
}
