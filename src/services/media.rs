//! Media lifecycle for property records
//!
//! Transcodes newly uploaded photos, reconciles the final ordered image
//! list against the caller's keep-list, resolves the single attached
//! document, and deletes orphaned physical files. Every newly written file
//! is recorded in a per-request [`MediaIntentLog`] so a later persistence
//! failure can be compensated by removing exactly what this request wrote.

use crate::error::{Error, Result};
use crate::models::TempUpload;
use crate::services::store::{extension_or, MediaStore};
use crate::services::transcoder::{ImageTranscoder, OUTPUT_EXTENSION};
use std::path::Path;
use tracing::{info, warn};

/// Files written during one create/update request
///
/// On a storage failure after media work has happened, compensating with
/// this log removes the would-be orphans instead of leaving them on disk.
#[derive(Debug, Default)]
pub struct MediaIntentLog {
    created: Vec<String>,
}

impl MediaIntentLog {
    pub fn record(&mut self, url: String) {
        self.created.push(url);
    }

    pub fn created(&self) -> &[String] {
        &self.created
    }

    /// Remove everything this request wrote to the media store
    pub async fn compensate(&self, store: &MediaStore) {
        if self.created.is_empty() {
            return;
        }
        warn!(
            "Persistence failed after media writes; removing {} file(s)",
            self.created.len()
        );
        store.delete_files(&self.created).await;
    }
}

/// Transcoding, reconciliation and orphan cleanup for one property's media
#[derive(Debug, Clone)]
pub struct MediaLifecycle {
    store: MediaStore,
    transcoder: ImageTranscoder,
}

impl MediaLifecycle {
    pub fn new(store: MediaStore) -> Self {
        Self {
            store,
            transcoder: ImageTranscoder::new(),
        }
    }

    pub fn store(&self) -> &MediaStore {
        &self.store
    }

    /// Transcode and store newly uploaded images, preserving input order
    ///
    /// A file that fails to transcode is kept untranscoded under its
    /// uploaded name; one bad input never aborts the batch. Returns the
    /// final URLs in the caller's selection order.
    pub async fn ingest_new_images(
        &self,
        raw_files: &[TempUpload],
        intent: &mut MediaIntentLog,
    ) -> Vec<String> {
        let mut urls = Vec::with_capacity(raw_files.len());
        for file in raw_files {
            if let Some(url) = self.ingest_one(file, intent).await {
                urls.push(url);
            }
        }
        urls
    }

    async fn ingest_one(&self, file: &TempUpload, intent: &mut MediaIntentLog) -> Option<String> {
        match self.transcoder.transcode_to_webp(&file.temp_path).await {
            Ok(bytes) => {
                let filename = self
                    .store
                    .unique_filename(&file.original_name, OUTPUT_EXTENSION);
                match self.store.write_file(&filename, &bytes).await {
                    Ok(url) => {
                        intent.record(url.clone());
                        remove_temp(&file.temp_path).await;
                        Some(url)
                    }
                    Err(e) => {
                        warn!(
                            "Failed to store transcoded image for {}: {}; keeping original",
                            file.original_name, e
                        );
                        self.keep_original(file, intent).await
                    }
                }
            }
            Err(e) => {
                warn!(
                    "Transcoding failed for {}: {}; keeping original",
                    file.original_name, e
                );
                self.keep_original(file, intent).await
            }
        }
    }

    /// Fallback path: promote the uploaded bytes unmodified
    async fn keep_original(&self, file: &TempUpload, intent: &mut MediaIntentLog) -> Option<String> {
        let ext = extension_or(&file.original_name, "img");
        let filename = self.store.unique_filename(&file.original_name, &ext);
        match self.promote_temp(&file.temp_path, &filename).await {
            Ok(url) => {
                intent.record(url.clone());
                Some(url)
            }
            Err(e) => {
                warn!("Dropping image {}: {}", file.original_name, e);
                None
            }
        }
    }

    /// Final ordered image list: the caller's keep-list, then the newly
    /// ingested files, concatenated
    ///
    /// The caller's arrangement (drag-to-reorder) is authoritative and is
    /// never resorted. Both inputs empty yields an empty list; this layer
    /// does not enforce a minimum image count.
    pub async fn reconcile_image_order(
        &self,
        keep_list: Vec<String>,
        new_files: &[TempUpload],
        intent: &mut MediaIntentLog,
    ) -> Vec<String> {
        let mut final_urls = keep_list;
        final_urls.extend(self.ingest_new_images(new_files, intent).await);
        final_urls
    }

    /// Decide which document stays attached to the record
    ///
    /// Precedence: a new upload wins over a pending deletion request, which
    /// wins over keeping the current reference. The displaced physical file
    /// is deleted in the first two cases.
    pub async fn resolve_document(
        &self,
        current_url: Option<&str>,
        new_file: Option<&TempUpload>,
        deletion_requests: &[String],
        intent: &mut MediaIntentLog,
    ) -> Result<Option<String>> {
        if let Some(file) = new_file {
            let ext = extension_or(&file.original_name, "pdf");
            let filename = self.store.unique_filename(&file.original_name, &ext);
            let url = self.promote_temp(&file.temp_path, &filename).await?;
            intent.record(url.clone());
            if let Some(old) = current_url {
                self.store.delete_files(&[old.to_string()]).await;
            }
            return Ok(Some(url));
        }

        if let Some(current) = current_url {
            if deletion_requests.iter().any(|d| d == current) {
                info!("Document removed at caller's request");
                self.store.delete_files(&[current.to_string()]).await;
                return Ok(None);
            }
        }

        Ok(current_url.map(str::to_string))
    }

    /// Best-effort deletion of referenced files
    pub async fn delete_physical_files(&self, urls: &[String]) {
        self.store.delete_files(urls).await;
    }

    /// Move staged bytes into the store under their final name
    async fn promote_temp(&self, temp_path: &Path, filename: &str) -> Result<String> {
        let dest = self.store.uploads_dir().join(filename);
        match tokio::fs::rename(temp_path, &dest).await {
            Ok(()) => {}
            Err(_) => {
                // Rename fails across filesystems; fall back to copy+remove
                tokio::fs::copy(temp_path, &dest)
                    .await
                    .map_err(Error::from)?;
                remove_temp(temp_path).await;
            }
        }
        Ok(self.store.url_for(filename))
    }
}

async fn remove_temp(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove temp upload {}: {}", path.display(), e);
        }
    }
}
