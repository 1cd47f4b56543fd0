//! Record synchronization
//!
//! Orchestrates create/update/delete of a property record: runs the media
//! lifecycle, maps the submitted form fields into the persisted shape, and
//! talks to the database. Not-found is an outcome (`None` / `false`), not
//! an error. A persistence failure after media writes triggers a
//! compensating cleanup from the request's intent log.

use crate::db;
use crate::error::Result;
use crate::models::fields::{
    normalize_video_url, parse_bool_flag, parse_f64, parse_i64, parse_json_field,
};
use crate::models::{Property, PropertyDraft, PropertySubmission, UploadSet};
use crate::services::media::{MediaIntentLog, MediaLifecycle};
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::info;

/// Create/update/delete orchestration for property records
#[derive(Debug, Clone)]
pub struct PropertySync {
    db: SqlitePool,
    media: MediaLifecycle,
}

impl PropertySync {
    pub fn new(db: SqlitePool, media: MediaLifecycle) -> Self {
        Self { db, media }
    }

    pub fn media(&self) -> &MediaLifecycle {
        &self.media
    }

    /// Create a new record from a submission and its uploaded files
    pub async fn create(&self, data: PropertySubmission, files: UploadSet) -> Result<Property> {
        let mut intent = MediaIntentLog::default();

        let images = self.media.ingest_new_images(&files.images, &mut intent).await;
        let pdf_url = match self
            .media
            .resolve_document(None, files.document.as_ref(), &[], &mut intent)
            .await
        {
            Ok(url) => url,
            Err(e) => {
                intent.compensate(self.media.store()).await;
                return Err(e);
            }
        };

        let draft = map_submission(&data, images, pdf_url);
        let id = match db::properties::insert(&self.db, &draft).await {
            Ok(id) => id,
            Err(e) => {
                intent.compensate(self.media.store()).await;
                return Err(e);
            }
        };

        info!("Created property {}", id);
        let created = db::properties::find_by_id(&self.db, id).await?;
        created.ok_or_else(|| {
            crate::error::Error::Internal(format!("Property {} vanished after insert", id))
        })
    }

    /// Update an existing record; `Ok(None)` when the id does not exist
    pub async fn update(
        &self,
        id: i64,
        data: PropertySubmission,
        files: UploadSet,
    ) -> Result<Option<Property>> {
        let existing = match db::properties::find_by_id(&self.db, id).await? {
            Some(p) => p,
            None => return Ok(None),
        };

        let files_to_delete: Vec<String> =
            parse_json_field(data.files_to_delete.as_deref()).into_value("filesToDelete");
        if !files_to_delete.is_empty() {
            info!(
                "Deleting {} file(s) flagged by the caller",
                files_to_delete.len()
            );
            self.media.delete_physical_files(&files_to_delete).await;
        }

        let keep_list: Vec<String> = parse_json_field(data.existing_image_urls_to_keep.as_deref())
            .into_value("existingImageUrlsToKeep");

        let mut intent = MediaIntentLog::default();
        let images = self
            .media
            .reconcile_image_order(keep_list, &files.images, &mut intent)
            .await;

        let pdf_url = match self
            .media
            .resolve_document(
                existing.pdf_url.as_deref(),
                files.document.as_ref(),
                &files_to_delete,
                &mut intent,
            )
            .await
        {
            Ok(url) => url,
            Err(e) => {
                intent.compensate(self.media.store()).await;
                return Err(e);
            }
        };

        let draft = map_submission(&data, images, pdf_url);
        if let Err(e) = db::properties::update(&self.db, id, &draft).await {
            intent.compensate(self.media.store()).await;
            return Err(e);
        }

        info!("Updated property {}", id);
        db::properties::find_by_id(&self.db, id).await
    }

    /// Delete a record and every physical file it references
    ///
    /// `Ok(false)` when the id does not exist. File deletion is attempted
    /// first and is best-effort; it never blocks row deletion.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let existing = match db::properties::find_by_id(&self.db, id).await? {
            Some(p) => p,
            None => {
                info!("Property {} not found, nothing to delete", id);
                return Ok(false);
            }
        };

        let referenced = existing.referenced_files();
        if !referenced.is_empty() {
            self.media.delete_physical_files(&referenced).await;
        }

        db::properties::delete_row(&self.db, id).await?;
        info!("Deleted property {} and {} file(s)", id, referenced.len());
        Ok(true)
    }
}

/// Map submitted fields into the persisted shape
///
/// Numeric fields coerce or become None; JSON-bearing fields fall back to
/// their empty default (logged); the video link is normalized to its embed
/// form. Shared by create and update so both map identically.
fn map_submission(
    data: &PropertySubmission,
    images: Vec<String>,
    pdf_url: Option<String>,
) -> PropertyDraft {
    let characteristics: serde_json::Map<String, Value> =
        parse_json_field(data.specific_characteristics.as_deref())
            .into_value("specificCharacteristics");
    let amenities: Vec<String> =
        parse_json_field(data.amenities.as_deref()).into_value("amenities");
    let internal_docs_urls: Vec<String> =
        parse_json_field(data.internal_docs_urls.as_deref()).into_value("internalDocsUrls");

    PropertyDraft {
        name: data.name.clone().unwrap_or_default(),
        address: data.address.clone().unwrap_or_default(),
        locality: data.locality.clone().unwrap_or_default(),
        neighbourhood: data.neighbourhood.clone(),
        description: data.description.clone().unwrap_or_default(),
        property_type: data.property_type.clone().unwrap_or_default(),
        subtype: data.subtype.clone().unwrap_or_default(),
        category: data.category.clone().unwrap_or_default(),
        price: parse_f64(data.price.as_deref()),
        currency: data.currency.clone().unwrap_or_else(|| "USD".to_string()),
        total_surface: parse_f64(data.total_surface.as_deref()),
        covered_surface: parse_f64(data.covered_surface.as_deref()),
        latitude: parse_f64(data.latitude.as_deref()),
        longitude: parse_f64(data.longitude.as_deref()),
        images,
        video_url: normalize_video_url(data.video_url.as_deref()),
        pdf_url,
        specific_characteristics: Value::Object(characteristics),
        amenities,
        internal_docs_urls,
        property_source: data
            .property_source
            .clone()
            .unwrap_or_else(|| "propia".to_string()),
        private_notes: data.private_notes.clone(),
        owner_id: parse_i64(data.owner_id.as_deref()),
        agent_id: parse_i64(data.agent_id.as_deref()),
        colleague_id: parse_i64(data.colleague_id.as_deref()),
        is_published: parse_bool_flag(data.is_published.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TempUpload;
    use crate::services::store::MediaStore;
    use image::{ImageBuffer, Rgb};
    use std::path::Path;

    async fn test_sync(dir: &Path) -> PropertySync {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        crate::db::init_tables(&pool).await.unwrap();
        std::fs::create_dir_all(crate::config::tmp_upload_dir(dir)).unwrap();
        PropertySync::new(pool.clone(), MediaLifecycle::new(MediaStore::new(dir)))
    }

    fn stage_png(sync: &PropertySync, original_name: &str) -> TempUpload {
        let temp_path = sync
            .media()
            .store()
            .tmp_dir()
            .join(format!("{}.png", uuid::Uuid::new_v4()));
        let img = ImageBuffer::from_fn(32, 32, |_, _| Rgb([10u8, 120u8, 200u8]));
        img.save(&temp_path).unwrap();
        TempUpload {
            original_name: original_name.to_string(),
            temp_path,
        }
    }

    fn stage_pdf(sync: &PropertySync, original_name: &str) -> TempUpload {
        let temp_path = sync
            .media()
            .store()
            .tmp_dir()
            .join(uuid::Uuid::new_v4().to_string());
        std::fs::write(&temp_path, b"%PDF-1.4 test").unwrap();
        TempUpload {
            original_name: original_name.to_string(),
            temp_path,
        }
    }

    fn submission(name: &str) -> PropertySubmission {
        PropertySubmission {
            name: Some(name.to_string()),
            address: Some("Av. Siempreviva 742".to_string()),
            locality: Some("Springfield".to_string()),
            description: Some("Amplia casa".to_string()),
            property_type: Some("house".to_string()),
            subtype: Some("chalet".to_string()),
            category: Some("sale".to_string()),
            price: Some("185000.50".to_string()),
            is_published: Some("true".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_persists_record_with_media() {
        let dir = tempfile::tempdir().unwrap();
        let sync = test_sync(dir.path()).await;

        let files = UploadSet {
            images: vec![stage_png(&sync, "frente.png"), stage_png(&sync, "patio.png")],
            document: Some(stage_pdf(&sync, "plano.pdf")),
        };

        let created = sync.create(submission("Casa Quinta"), files).await.unwrap();

        assert_eq!(created.name, "Casa Quinta");
        assert_eq!(created.price, Some(185000.50));
        assert!(created.is_published);
        assert_eq!(created.images.len(), 2);
        assert!(created.images[0].starts_with("/uploads/frente-"));
        assert!(created.images[1].starts_with("/uploads/patio-"));
        let pdf = created.pdf_url.as_deref().expect("document stored");
        assert!(pdf.starts_with("/uploads/plano-"));
        assert!(sync.media().store().path_for_url(pdf).exists());
    }

    #[tokio::test]
    async fn create_recovers_from_malformed_json_fields() {
        let dir = tempfile::tempdir().unwrap();
        let sync = test_sync(dir.path()).await;

        let mut data = submission("Depto");
        data.amenities = Some("{not json".to_string());
        data.specific_characteristics = Some("[oops".to_string());

        let created = sync.create(data, UploadSet::default()).await.unwrap();
        assert!(created.amenities.is_empty());
        assert_eq!(created.specific_characteristics, serde_json::json!({}));
    }

    #[tokio::test]
    async fn update_missing_record_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let sync = test_sync(dir.path()).await;

        let result = sync
            .update(404, submission("Nada"), UploadSet::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn update_applies_caller_image_order() {
        let dir = tempfile::tempdir().unwrap();
        let sync = test_sync(dir.path()).await;

        let files = UploadSet {
            images: vec![stage_png(&sync, "uno.png"), stage_png(&sync, "dos.png")],
            document: None,
        };
        let created = sync.create(submission("Casa"), files).await.unwrap();
        let [first, second]: [String; 2] = created.images.clone().try_into().unwrap();

        // Caller reverses the two kept images and adds a third
        let mut data = submission("Casa");
        data.existing_image_urls_to_keep =
            Some(serde_json::to_string(&vec![second.clone(), first.clone()]).unwrap());
        let files = UploadSet {
            images: vec![stage_png(&sync, "tres.png")],
            document: None,
        };

        let updated = sync.update(created.id, data, files).await.unwrap().unwrap();
        assert_eq!(updated.images.len(), 3);
        assert_eq!(updated.images[0], second);
        assert_eq!(updated.images[1], first);
        assert!(updated.images[2].starts_with("/uploads/tres-"));
    }

    #[tokio::test]
    async fn update_deletes_flagged_files_and_document() {
        let dir = tempfile::tempdir().unwrap();
        let sync = test_sync(dir.path()).await;

        let files = UploadSet {
            images: vec![stage_png(&sync, "foto.png")],
            document: Some(stage_pdf(&sync, "viejo.pdf")),
        };
        let created = sync.create(submission("Casa"), files).await.unwrap();
        let image_url = created.images[0].clone();
        let pdf_url = created.pdf_url.clone().unwrap();

        // Caller drops both the image and the document
        let mut data = submission("Casa");
        data.existing_image_urls_to_keep = Some("[]".to_string());
        data.files_to_delete =
            Some(serde_json::to_string(&vec![image_url.clone(), pdf_url.clone()]).unwrap());

        let updated = sync
            .update(created.id, data, UploadSet::default())
            .await
            .unwrap()
            .unwrap();

        assert!(updated.images.is_empty());
        assert!(updated.pdf_url.is_none());
        assert!(!sync.media().store().path_for_url(&image_url).exists());
        assert!(!sync.media().store().path_for_url(&pdf_url).exists());
    }

    #[tokio::test]
    async fn delete_removes_row_and_files() {
        let dir = tempfile::tempdir().unwrap();
        let sync = test_sync(dir.path()).await;

        let files = UploadSet {
            images: vec![stage_png(&sync, "foto.png")],
            document: Some(stage_pdf(&sync, "plano.pdf")),
        };
        let created = sync.create(submission("Casa"), files).await.unwrap();
        let referenced = created.referenced_files();

        assert!(sync.delete(created.id).await.unwrap());
        for url in referenced {
            assert!(!sync.media().store().path_for_url(&url).exists());
        }
        // Row is gone: a second delete reports not-found
        assert!(!sync.delete(created.id).await.unwrap());
    }

    #[tokio::test]
    async fn delete_missing_record_is_false() {
        let dir = tempfile::tempdir().unwrap();
        let sync = test_sync(dir.path()).await;
        assert!(!sync.delete(12345).await.unwrap());
    }
}
