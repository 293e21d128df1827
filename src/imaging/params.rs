//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how*. The high-level
//! [`operations`](super::operations) module passes them to an
//! [`ImageBackend`](super::ImageBackend), which does the pixel work.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 75). Clamped on construction.
//! - [`StampStyle`]: color, size and placement of the burned-in date.
//! - [`RenderParams`]: everything the final render needs besides the photo itself.

use crate::config::{ImagesConfig, StampConfig};

/// Quality setting for JPEG encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    /// Matches the quality most office tools use when re-saving a photo.
    fn default() -> Self {
        Self(75)
    }
}

/// How the date stamp is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StampStyle {
    pub color: [u8; 3],
    /// Font size in pixels.
    pub font_size: f32,
    /// Gap between the estimated end of the text and the right edge.
    pub right_margin: u32,
    /// Distance from the bottom edge up to the top of the text.
    pub bottom_offset: u32,
}

impl Default for StampStyle {
    fn default() -> Self {
        Self {
            color: [255, 165, 0],
            font_size: 80.0,
            right_margin: 100,
            bottom_offset: 120,
        }
    }
}

impl From<&StampConfig> for StampStyle {
    fn from(config: &StampConfig) -> Self {
        Self {
            color: config.color,
            font_size: config.font_size as f32,
            right_margin: config.right_margin,
            bottom_offset: config.bottom_offset,
        }
    }
}

/// Parameters for turning one upload into the JPEG embedded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderParams {
    pub stamp: StampStyle,
    pub quality: Quality,
}

impl RenderParams {
    pub fn from_config(stamp: &StampConfig, images: &ImagesConfig) -> Self {
        Self {
            stamp: StampStyle::from(stamp),
            quality: Quality::new(images.quality),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_75() {
        assert_eq!(Quality::default().value(), 75);
    }

    #[test]
    fn stamp_style_defaults() {
        let s = StampStyle::default();
        assert_eq!(s.color, [255, 165, 0]);
        assert_eq!(s.font_size, 80.0);
        assert_eq!(s.right_margin, 100);
        assert_eq!(s.bottom_offset, 120);
    }

    #[test]
    fn render_params_from_default_config_match_defaults() {
        let params = RenderParams::from_config(&StampConfig::default(), &ImagesConfig::default());
        assert_eq!(params, RenderParams::default());
    }
}
