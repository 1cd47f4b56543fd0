//! Persistent media store
//!
//! A directory addressable by filename. Records reference files through
//! relative URLs of the form `/uploads/<filename>`; only the basename of a
//! URL is ever joined back onto the directory, so a crafted URL cannot
//! escape it. The directory is injected at construction, never read from
//! ambient state.

use crate::error::Result;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// URL prefix under which the store is served
pub const URL_PREFIX: &str = "/uploads";

/// Filesystem-backed media store
#[derive(Debug, Clone)]
pub struct MediaStore {
    uploads_dir: PathBuf,
}

impl MediaStore {
    pub fn new(uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
        }
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Staging area for in-flight uploads
    pub fn tmp_dir(&self) -> PathBuf {
        crate::config::tmp_upload_dir(&self.uploads_dir)
    }

    /// Relative URL a stored filename is served under
    pub fn url_for(&self, filename: &str) -> String {
        format!("{}/{}", URL_PREFIX, filename)
    }

    /// On-disk location of a referenced URL
    ///
    /// Takes the basename only; directory components in the URL are
    /// discarded.
    pub fn path_for_url(&self, url: &str) -> PathBuf {
        let basename = Path::new(url)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.uploads_dir.join(basename)
    }

    /// `<sanitized-base>-<token>.<ext>` for a client-supplied filename
    ///
    /// The token is a millisecond timestamp, which keeps names from
    /// distinct uploads from colliding.
    pub fn unique_filename(&self, original_name: &str, ext: &str) -> String {
        let base = sanitize_base_name(original_name);
        format!("{}-{}.{}", base, Utc::now().timestamp_millis(), ext)
    }

    /// Write final bytes into the store, returning the file's URL
    pub async fn write_file(&self, filename: &str, bytes: &[u8]) -> Result<String> {
        let path = self.uploads_dir.join(filename);
        tokio::fs::write(&path, bytes).await?;
        Ok(self.url_for(filename))
    }

    /// Best-effort physical deletion
    ///
    /// Missing files are skipped, errors are logged; never fails, safe to
    /// call twice on the same set.
    pub async fn delete_files(&self, urls: &[String]) {
        for url in urls {
            if url.is_empty() {
                continue;
            }
            let path = self.path_for_url(url);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!("Deleted media file {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!("Media file already absent: {}", path.display());
                }
                Err(e) => warn!("Failed to delete media file {}: {}", path.display(), e),
            }
        }
    }
}

/// Strip a client filename down to `[A-Za-z0-9_-]`
///
/// Whitespace runs collapse to single hyphens, everything else outside the
/// allowed set is dropped, and hyphen runs collapse. An empty result
/// becomes "file" so the stored name is never extension-only.
pub fn sanitize_base_name(original_name: &str) -> String {
    let stem = Path::new(original_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut out = String::with_capacity(stem.len());
    let mut last_hyphen = false;
    for c in stem.chars() {
        let mapped = if c.is_whitespace() {
            Some('-')
        } else if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            Some(c)
        } else {
            None
        };
        if let Some(c) = mapped {
            if c == '-' {
                if !last_hyphen {
                    out.push('-');
                }
                last_hyphen = true;
            } else {
                out.push(c);
                last_hyphen = false;
            }
        }
    }

    if out.is_empty() {
        "file".to_string()
    } else {
        out
    }
}

/// Extension of a client filename, lowercased; `fallback` when absent
pub fn extension_or(original_name: &str, fallback: &str) -> String {
    Path::new(original_name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_else(|| fallback.to_string())
}
