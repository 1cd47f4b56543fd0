//! Defensive decoding of submitted form fields
//!
//! Multipart form fields arrive as text. Numeric coercion returns `None`
//! for anything unparseable; JSON-bearing fields go through a tagged parse
//! so callers can tell a real value from a substituted default and log the
//! substitution.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::warn;

/// Outcome of parsing a JSON-bearing form field
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedJson<T> {
    /// Field was absent, or present and well-formed
    Parsed(T),
    /// Field was present but malformed; the raw text is kept for logging
    Defaulted { raw: String },
}

impl<T: Default> ParsedJson<T> {
    /// Unwrap to the parsed value, substituting (and logging) the default
    /// on a parse failure. A malformed fragment never aborts a write.
    pub fn into_value(self, field: &str) -> T {
        match self {
            ParsedJson::Parsed(value) => value,
            ParsedJson::Defaulted { raw } => {
                warn!("Malformed JSON in field '{}', using default: {}", field, raw);
                T::default()
            }
        }
    }
}

/// Parse a JSON-bearing field. Absent fields parse to the type's default.
pub fn parse_json_field<T>(raw: Option<&str>) -> ParsedJson<T>
where
    T: DeserializeOwned + Default,
{
    match raw {
        None => ParsedJson::Parsed(T::default()),
        Some(text) if text.trim().is_empty() => ParsedJson::Parsed(T::default()),
        Some(text) => match serde_json::from_str(text) {
            Ok(value) => ParsedJson::Parsed(value),
            Err(_) => ParsedJson::Defaulted {
                raw: text.to_string(),
            },
        },
    }
}

/// Coerce a text field to f64; unparseable or absent becomes None
pub fn parse_f64(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse().ok())
}

/// Coerce a text field to i64; unparseable or absent becomes None
pub fn parse_i64(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse().ok())
}

/// Checkbox-style boolean: only the literal "true" is true
pub fn parse_bool_flag(raw: Option<&str>) -> bool {
    raw.map(|s| s == "true").unwrap_or(false)
}

static YOUTUBE_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?:youtube\.com/(?:[^/]+/.+/|v/|embed/|watch\?v=|shorts/)|youtu\.be/)([^"&?/ ]{11})"#,
    )
    .expect("valid youtube regex")
});

/// Normalize a video link into its embeddable form
///
/// Accepts watch, shorts, youtu.be and embed URLs; anything unrecognized
/// yields None rather than a guessed URL.
pub fn normalize_video_url(raw: Option<&str>) -> Option<String> {
    let url = raw?.trim();
    if url.is_empty() {
        return None;
    }
    YOUTUBE_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|id| format!("https://www.youtube.com/embed/{}", id.as_str()))
}
