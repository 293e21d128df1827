//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::load_from_memory` (format sniffed from bytes) |
//! | EXIF orientation + capture date | `kamadak-exif` via [`crate::metadata`] |
//! | Date stamp | `imageproc::drawing::draw_text_mut` with an `ab_glyph` face, or the built-in face |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |

use super::backend::{BackendError, ImageBackend};
use super::calculations::stamp_origin;
use super::font::StampFont;
use super::params::{Quality, StampStyle};
use crate::metadata::{self, PhotoMetadata};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb};
use std::path::PathBuf;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// Owns the stamp font so it is loaded once per build and shared by all
/// workers.
#[derive(Debug)]
pub struct RustBackend {
    font: StampFont,
}

impl RustBackend {
    /// Backend that stamps with the built-in face.
    pub fn new() -> Self {
        Self {
            font: StampFont::Builtin,
        }
    }

    /// Backend using the first loadable font among `candidates`.
    pub fn with_font_candidates(candidates: &[PathBuf]) -> Self {
        Self {
            font: StampFont::load(candidates),
        }
    }

    pub fn with_font(font: StampFont) -> Self {
        Self { font }
    }

    pub fn font(&self) -> &StampFont {
        &self.font
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop palette and alpha channels, which JPEG cannot carry.
///
/// Images already in 8-bit RGB are moved through without copying.
pub fn into_rgb8(image: DynamicImage) -> image::RgbImage {
    match image {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => other.to_rgb8(),
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        image::load_from_memory(bytes).map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn read_metadata(&self, bytes: &[u8]) -> PhotoMetadata {
        metadata::read_photo_metadata(bytes)
    }

    fn stamp(&self, image: DynamicImage, text: &str, style: &StampStyle) -> DynamicImage {
        if text.is_empty() {
            return image;
        }
        let mut canvas = into_rgb8(image);
        let origin = stamp_origin(canvas.dimensions(), text, style);
        self.font.draw(
            &mut canvas,
            Rgb(style.color),
            origin.x,
            origin.y,
            style.font_size,
            text,
        );
        DynamicImage::ImageRgb8(canvas)
    }

    fn encode(&self, image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
        let rgb = match image {
            DynamicImage::ImageRgb8(_) => None,
            other => Some(DynamicImage::ImageRgb8(other.to_rgb8())),
        };
        let source = rgb.as_ref().unwrap_or(image);

        let mut buf = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buf, quality.value() as u8);
        source
            .write_with_encoder(encoder)
            .map_err(|e| BackendError::Encode(e.to_string()))?;
        Ok(buf)
    }
}
