//! Data types shared across db, services and api layers

pub mod fields;
pub mod property;
pub mod upload;

pub use property::{Property, PropertyDraft, PropertySubmission};
pub use upload::{TempUpload, UploadSet};
