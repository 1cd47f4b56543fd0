//! Property record types
//!
//! [`Property`] is the persisted row. [`PropertySubmission`] is the raw
//! client edit as it arrives from a multipart form (all text), and
//! [`PropertyDraft`] is the mapped, persistence-ready shape produced by the
//! record synchronizer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A persisted property record
///
/// `images` is ordered and caller-authoritative: position 0 is the cover
/// image. `pdf_url` is the single optional attached document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub locality: String,
    pub neighbourhood: Option<String>,
    pub description: String,
    #[serde(rename = "type")]
    pub property_type: String,
    pub subtype: String,
    pub category: String,
    pub price: Option<f64>,
    pub currency: String,
    pub total_surface: Option<f64>,
    pub covered_surface: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub images: Vec<String>,
    pub video_url: Option<String>,
    pub pdf_url: Option<String>,
    pub specific_characteristics: Value,
    pub amenities: Vec<String>,
    pub internal_docs_urls: Vec<String>,
    pub property_source: String,
    pub private_notes: Option<String>,
    pub owner_id: Option<i64>,
    pub agent_id: Option<i64>,
    pub colleague_id: Option<i64>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Property {
    /// All physical media URLs referenced by this record (images + document)
    pub fn referenced_files(&self) -> Vec<String> {
        let mut files = self.images.clone();
        if let Some(pdf) = &self.pdf_url {
            files.push(pdf.clone());
        }
        files
    }
}

/// Raw client-submitted edit, as decoded from multipart form text fields
///
/// Everything arrives as strings; numeric coercion and JSON parsing happen
/// during mapping, never here. Field names mirror the wire protocol.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertySubmission {
    pub name: Option<String>,
    pub address: Option<String>,
    pub locality: Option<String>,
    pub neighbourhood: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub property_type: Option<String>,
    pub subtype: Option<String>,
    pub category: Option<String>,
    pub price: Option<String>,
    pub currency: Option<String>,
    pub total_surface: Option<String>,
    pub covered_surface: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub video_url: Option<String>,
    pub property_source: Option<String>,
    pub private_notes: Option<String>,
    pub owner_id: Option<String>,
    pub agent_id: Option<String>,
    pub colleague_id: Option<String>,
    pub is_published: Option<String>,
    /// JSON object, parsed defensively during mapping
    pub specific_characteristics: Option<String>,
    /// JSON array of strings, parsed defensively during mapping
    pub amenities: Option<String>,
    /// JSON array of strings, parsed defensively during mapping
    pub internal_docs_urls: Option<String>,
    /// JSON array: previously-persisted image URLs to retain, in the
    /// caller's final order
    pub existing_image_urls_to_keep: Option<String>,
    /// JSON array: previously-persisted URLs the caller wants physically
    /// deleted
    pub files_to_delete: Option<String>,
}

impl PropertySubmission {
    /// Build a submission from the text fields of a multipart form
    ///
    /// Unknown fields are ignored; missing fields stay None.
    pub fn from_form_fields(fields: std::collections::HashMap<String, String>) -> Self {
        serde_json::to_value(fields)
            .ok()
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }
}

/// Mapped, persistence-ready record content (no id, no timestamps)
#[derive(Debug, Clone)]
pub struct PropertyDraft {
    pub name: String,
    pub address: String,
    pub locality: String,
    pub neighbourhood: Option<String>,
    pub description: String,
    pub property_type: String,
    pub subtype: String,
    pub category: String,
    pub price: Option<f64>,
    pub currency: String,
    pub total_surface: Option<f64>,
    pub covered_surface: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub images: Vec<String>,
    pub video_url: Option<String>,
    pub pdf_url: Option<String>,
    pub specific_characteristics: Value,
    pub amenities: Vec<String>,
    pub internal_docs_urls: Vec<String>,
    pub property_source: String,
    pub private_notes: Option<String>,
    pub owner_id: Option<i64>,
    pub agent_id: Option<i64>,
    pub colleague_id: Option<i64>,
    pub is_published: bool,
}
