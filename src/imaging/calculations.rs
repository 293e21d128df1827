//! Pure calculation functions for stamp placement and preview sizing.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! ## Stamp width heuristic
//!
//! The stamp is right-aligned using an *estimated* text width of
//! `character_count × font_size / 2`, not real glyph metrics. Digits and
//! dots in most faces are narrower or wider than half an em, so the actual
//! right margin drifts a little from the nominal 100 px. Keep the estimate:
//! stamp positions must match previously issued ledgers.

use super::params::StampStyle;

/// Estimated rendered width of `text` in pixels.
///
/// Counts characters, not bytes, so `２０２４` and `2024` estimate the same.
pub fn approx_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * (font_size / 2.0)
}

/// Distance from the image's right edge to the left edge of the stamp.
///
/// # Examples
/// ```
/// # use photo_ledger::imaging::{StampStyle, right_edge_offset};
/// // "2024.05.01" is 10 characters at 80px: 100 + 10 × 40
/// assert_eq!(right_edge_offset("2024.05.01", &StampStyle::default()), 500.0);
/// ```
pub fn right_edge_offset(text: &str, style: &StampStyle) -> f32 {
    style.right_margin as f32 + approx_text_width(text, style.font_size)
}

/// Top-left pixel where the stamp text starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StampOrigin {
    pub x: i32,
    pub y: i32,
}

/// Calculate where to draw `text` on an image of the given dimensions.
///
/// Coordinates may be negative when the text is wider than the image; the
/// renderer clips whatever falls outside.
pub fn stamp_origin(dimensions: (u32, u32), text: &str, style: &StampStyle) -> StampOrigin {
    let (width, height) = dimensions;
    let x = width as f32 - right_edge_offset(text, style);
    let y = height as i64 - style.bottom_offset as i64;
    StampOrigin {
        x: x.floor() as i32,
        y: y as i32,
    }
}

/// Fit dimensions inside a square of `max_edge`, preserving aspect ratio.
///
/// Images already inside the box are returned unchanged.
pub fn fit_within(original: (u32, u32), max_edge: u32) -> (u32, u32) {
    let (w, h) = original;
    let longer = w.max(h);
    if longer <= max_edge || longer == 0 {
        return original;
    }
    let ratio = max_edge as f64 / longer as f64;
    if w >= h {
        (max_edge, ((h as f64 * ratio).round() as u32).max(1))
    } else {
        (((w as f64 * ratio).round() as u32).max(1), max_edge)
    }
}
