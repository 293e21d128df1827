//! High-level image operations.
//!
//! These functions combine metadata decisions with backend execution. The
//! same [`decode_upright`] path serves the preview and the final render, so
//! both always make the same rotation decision for the same bytes.

use super::backend::{BackendError, ImageBackend};
use super::calculations::fit_within;
use super::params::RenderParams;
use crate::metadata::{Orientation, PhotoMetadata};
use image::DynamicImage;
use image::imageops::FilterType;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Physically rotate pixels according to an orientation tag.
///
/// Only 3, 6 and 8 rotate; everything else (including the mirrored
/// variants) leaves the image as decoded.
pub fn apply_orientation(image: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Rotate180 => image.rotate180(),
        Orientation::Rotate90Cw => image.rotate90(),
        Orientation::Rotate270Cw => image.rotate270(),
        Orientation::Normal | Orientation::Other(_) => image,
    }
}

/// Decode and rotate upright using an already-read orientation.
pub fn decode_upright(
    backend: &impl ImageBackend,
    bytes: &[u8],
    orientation: Orientation,
) -> Result<DynamicImage> {
    let image = backend.decode(bytes)?;
    Ok(apply_orientation(image, orientation))
}

/// Decode raw bytes into an upright image, whatever the orientation tag says.
pub fn normalize_orientation(backend: &impl ImageBackend, bytes: &[u8]) -> Result<DynamicImage> {
    let meta = backend.read_metadata(bytes);
    decode_upright(backend, bytes, meta.orientation)
}

/// Upright, downscaled rendition for on-screen preview.
pub fn preview(backend: &impl ImageBackend, bytes: &[u8], max_edge: u32) -> Result<DynamicImage> {
    let upright = normalize_orientation(backend, bytes)?;
    let (w, h) = fit_within((upright.width(), upright.height()), max_edge);
    if (w, h) == (upright.width(), upright.height()) {
        return Ok(upright);
    }
    Ok(upright.resize_exact(w, h, FilterType::Lanczos3))
}

/// A photo ready to embed: upright, stamped, re-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPhoto {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Run the final render for one photo.
///
/// `meta` must come from the same bytes; the caller reads it first because
/// the stamp text may depend on the capture date.
pub fn render_photo(
    backend: &impl ImageBackend,
    bytes: &[u8],
    meta: &PhotoMetadata,
    stamp_text: Option<&str>,
    params: &RenderParams,
) -> Result<RenderedPhoto> {
    let upright = decode_upright(backend, bytes, meta.orientation)?;
    let stamped = match stamp_text {
        Some(text) if !text.is_empty() => backend.stamp(upright, text, &params.stamp),
        _ => upright,
    };
    let jpeg = backend.encode(&stamped, params.quality)?;
    Ok(RenderedPhoto {
        jpeg,
        width: stamped.width(),
        height: stamped.height(),
    })
}
