//! HTTP handlers

pub mod contacts;
pub mod health;
pub mod properties;
pub mod public;
pub mod uploads;

pub use contacts::contact_routes;
pub use health::health_routes;
pub use properties::admin_routes;
pub use public::public_routes;
