//! Shared test utilities for the photo-ledger test suite.
//!
//! Builds synthetic photo bytes in memory so no test needs fixture files:
//! plain JPEG/PNG encodes, and JPEGs carrying a hand-assembled EXIF APP1
//! segment with exactly the tags a test asks for.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let bytes = jpeg_with_exif(40, 20, [200, 10, 10], ExifSpec {
//!     orientation: Some(6),
//!     datetime_original: Some("2024:05:01 10:00:00".into()),
//! });
//! ```

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

use crate::types::PhotoEntry;

// =========================================================================
// Plain encodes
// =========================================================================

/// Solid-color RGB image.
pub fn solid_rgb(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb(color))
}

/// Image whose left half is `left` and right half is `right`.
///
/// Rotations move the halves around, which makes orientation checks easy
/// even after lossy JPEG encoding.
pub fn split_rgb(width: u32, height: u32, left: [u8; 3], right: [u8; 3]) -> RgbImage {
    RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 { Rgb(left) } else { Rgb(right) }
    })
}

/// Encode an RGB image as baseline JPEG (no EXIF).
pub fn encode_jpeg(img: &RgbImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut buf, ImageFormat::Jpeg)
        .unwrap();
    buf.into_inner()
}

/// Solid-color JPEG bytes without any metadata.
pub fn jpeg_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    encode_jpeg(&solid_rgb(width, height, color))
}

/// Solid-color RGBA PNG bytes.
pub fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba(color));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

// =========================================================================
// EXIF
// =========================================================================

/// Tags to embed in a synthetic EXIF block.
#[derive(Debug, Clone, Default)]
pub struct ExifSpec {
    pub orientation: Option<u16>,
    /// Raw `DateTimeOriginal` text, normally `YYYY:MM:DD HH:MM:SS`.
    pub datetime_original: Option<String>,
}

/// Big-endian TIFF structure holding IFD0 (Orientation, ExifIFD pointer)
/// and, when a timestamp is requested, an Exif sub-IFD with DateTimeOriginal.
fn build_tiff(spec: &ExifSpec) -> Vec<u8> {
    let mut ifd0: Vec<(u16, u16, u32, [u8; 4])> = Vec::new();
    if let Some(o) = spec.orientation {
        let v = o.to_be_bytes();
        ifd0.push((0x0112, 3, 1, [v[0], v[1], 0, 0]));
    }

    let ifd0_len = 2 + 12 * (ifd0.len() + usize::from(spec.datetime_original.is_some())) + 4;
    let exif_ifd_offset = (8 + ifd0_len) as u32;
    if spec.datetime_original.is_some() {
        ifd0.push((0x8769, 4, 1, exif_ifd_offset.to_be_bytes()));
    }

    let mut out = Vec::new();
    out.extend_from_slice(b"MM\x00\x2A");
    out.extend_from_slice(&8u32.to_be_bytes());
    write_ifd(&mut out, &ifd0);

    if let Some(dt) = &spec.datetime_original {
        let mut text = dt.as_bytes().to_vec();
        text.push(0);
        let string_offset = exif_ifd_offset + 2 + 12 + 4;
        let entries = [(
            0x9003,
            2,
            text.len() as u32,
            string_offset.to_be_bytes(),
        )];
        write_ifd(&mut out, &entries);
        out.extend_from_slice(&text);
    }
    out
}

fn write_ifd(out: &mut Vec<u8>, entries: &[(u16, u16, u32, [u8; 4])]) {
    out.extend_from_slice(&(entries.len() as u16).to_be_bytes());
    for (tag, kind, count, value) in entries {
        out.extend_from_slice(&tag.to_be_bytes());
        out.extend_from_slice(&kind.to_be_bytes());
        out.extend_from_slice(&count.to_be_bytes());
        out.extend_from_slice(value);
    }
    out.extend_from_slice(&0u32.to_be_bytes());
}

/// Splice an `Exif\0\0` APP1 segment directly after the SOI marker.
pub fn insert_exif(jpeg: &[u8], spec: &ExifSpec) -> Vec<u8> {
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "not a JPEG");
    let mut payload = b"Exif\x00\x00".to_vec();
    payload.extend_from_slice(&build_tiff(spec));
    let seg_len = (payload.len() + 2) as u16;

    let mut out = Vec::with_capacity(jpeg.len() + payload.len() + 4);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&seg_len.to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Solid-color JPEG with the given EXIF tags.
pub fn jpeg_with_exif(width: u32, height: u32, color: [u8; 3], spec: ExifSpec) -> Vec<u8> {
    insert_exif(&jpeg_bytes(width, height, color), &spec)
}

// =========================================================================
// Entries and pixel checks
// =========================================================================

/// A photo entry labelled after its position.
pub fn entry(index: usize, bytes: Vec<u8>) -> PhotoEntry {
    PhotoEntry::new(index, bytes, format!("({})", index + 1), "トイレ手すり取り付け")
}

/// Whether two colors are within `tolerance` per channel (JPEG is lossy).
pub fn near(a: [u8; 3], b: [u8; 3], tolerance: u8) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x.abs_diff(*y) <= tolerance)
}

/// Count pixels in a rectangle that look like the stamp orange.
pub fn count_orange(img: &RgbImage, x0: u32, y0: u32, x1: u32, y1: u32) -> usize {
    let mut n = 0;
    for y in y0..y1.min(img.height()) {
        for x in x0..x1.min(img.width()) {
            let p = img.get_pixel(x, y).0;
            if p[0] > 200 && (120..=210).contains(&p[1]) && p[2] < 90 {
                n += 1;
            }
        }
    }
    n
}
