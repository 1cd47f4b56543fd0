//! Service layer: media lifecycle, record synchronization, query relaxation

pub mod media;
pub mod relaxation;
pub mod store;
pub mod sync;
pub mod transcoder;

pub use media::{MediaIntentLog, MediaLifecycle};
pub use relaxation::{RelaxationEngine, SuggestionFilters};
pub use store::MediaStore;
pub use sync::PropertySync;
pub use transcoder::ImageTranscoder;
