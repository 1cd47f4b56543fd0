//! Listing photo transcoding
//!
//! Uploaded images are re-encoded as width-capped, fixed-quality WebP.
//! Decoding and encoding are CPU-bound, so the work runs inside
//! `spawn_blocking`.

use crate::error::{Error, Result};
use image::{imageops, DynamicImage, GenericImageView};
use std::ops::Deref;
use std::path::Path;

/// Maximum output width in pixels; narrower inputs are never upscaled
pub const MAX_WIDTH: u32 = 1200;
/// Lossy WebP quality (0-100)
pub const WEBP_QUALITY: f32 = 80.0;
/// Extension every transcoded image is re-emitted with
pub const OUTPUT_EXTENSION: &str = "webp";

/// Fixed-parameter image transcoder
#[derive(Debug, Clone)]
pub struct ImageTranscoder {
    max_width: u32,
    quality: f32,
}

impl ImageTranscoder {
    pub fn new() -> Self {
        Self {
            max_width: MAX_WIDTH,
            quality: WEBP_QUALITY,
        }
    }

    /// Read an image file and return its WebP-encoded bytes
    pub async fn transcode_to_webp(&self, source: &Path) -> Result<Vec<u8>> {
        let source = source.to_path_buf();
        let max_width = self.max_width;
        let quality = self.quality;

        tokio::task::spawn_blocking(move || encode_webp(&source, max_width, quality))
            .await
            .map_err(|e| Error::Internal(format!("Transcode task panicked: {}", e)))?
    }
}

impl Default for ImageTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_webp(source: &Path, max_width: u32, quality: f32) -> Result<Vec<u8>> {
    let mut img = image::open(source)
        .map_err(|e| Error::Internal(format!("Image decode failed: {}", e)))?;

    let (width, height) = img.dimensions();
    if width > max_width {
        let scaled_height =
            ((height as f64 * max_width as f64 / width as f64).round() as u32).max(1);
        img = DynamicImage::ImageRgba8(imageops::resize(
            &img,
            max_width,
            scaled_height,
            imageops::FilterType::Triangle,
        ));
    }

    // The WebP encoder only accepts RGB8/RGBA8 layouts
    let img = DynamicImage::ImageRgba8(img.to_rgba8());
    let encoder = webp::Encoder::from_image(&img)
        .map_err(|reason| Error::Internal(format!("WebP encoder rejected image: {}", reason)))?;

    Ok(encoder.encode(quality).deref().to_owned())
}
