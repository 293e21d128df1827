//! Font selection for the date stamp.
//!
//! Fonts are tried in the configured order (by default a Japanese-capable
//! Noto/Meiryo face first, then DejaVu Sans). If none of them can be read
//! and parsed, the stamp falls back to a built-in dot-matrix face, so
//! loading a [`StampFont`] never fails.
//!
//! The built-in face is 5×7 dots per glyph and covers digits plus the
//! punctuation that appears in dates. Any other character is drawn as a
//! hollow box.

use ab_glyph::{Font, FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::{Path, PathBuf};

/// Font used to draw the date stamp.
pub enum StampFont {
    /// A TrueType/OpenType face loaded from disk.
    Outline { font: FontVec, source: PathBuf },
    /// Dot-matrix fallback compiled into the binary.
    Builtin,
}

impl std::fmt::Debug for StampFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Outline { source, .. } => f.debug_tuple("Outline").field(source).finish(),
            Self::Builtin => f.write_str("Builtin"),
        }
    }
}

impl StampFont {
    /// Load the first usable font among `candidates`.
    pub fn load(candidates: &[PathBuf]) -> Self {
        for path in candidates {
            match load_outline(path) {
                Ok(font) => {
                    tracing::debug!("stamp font: {}", path.display());
                    return Self::Outline {
                        font,
                        source: path.clone(),
                    };
                }
                Err(reason) => tracing::debug!("skipping font {}: {reason}", path.display()),
            }
        }
        tracing::warn!("no stamp font found, using the built-in face");
        Self::Builtin
    }

    /// Human-readable description of where the face came from.
    pub fn describe(&self) -> String {
        match self {
            Self::Outline { source, .. } => source.display().to_string(),
            Self::Builtin => "built-in".to_string(),
        }
    }

    /// Draw `text` with its top-left corner at `(x, y)`. Pixels that fall
    /// outside the canvas are clipped.
    pub fn draw(&self, canvas: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, size: f32, text: &str) {
        match self {
            Self::Outline { font, .. } => {
                draw_text_mut(canvas, color, x, y, em_scale(font, size), font, text);
            }
            Self::Builtin => draw_builtin(canvas, color, x, y, size, text),
        }
    }
}

/// Scale at which one em is `size` pixels.
///
/// `PxScale` measures the line height (ascent minus descent), which is
/// larger than the em for most faces.
fn em_scale(font: &FontVec, size: f32) -> PxScale {
    match font.units_per_em() {
        Some(units_per_em) => PxScale::from(size * font.height_unscaled() / units_per_em),
        None => PxScale::from(size),
    }
}

fn load_outline(path: &Path) -> Result<FontVec, String> {
    let data = std::fs::read(path).map_err(|e| e.to_string())?;
    // Index 0 also selects the first face of a .ttc collection.
    FontVec::try_from_vec_and_index(data, 0).map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// Built-in dot-matrix face
// ---------------------------------------------------------------------------

const GLYPH_COLS: u32 = 5;
const GLYPH_ROWS: usize = 7;
/// Glyph width plus one column of spacing.
const ADVANCE_COLS: u32 = GLYPH_COLS + 1;

type Glyph = [u8; GLYPH_ROWS];

const BOX: Glyph = [0b11111, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11111];

/// Row bitmaps, most significant of the low five bits is the leftmost dot.
fn glyph(c: char) -> Glyph {
    match c {
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        '.' => [0, 0, 0, 0, 0, 0b01100, 0b01100],
        ':' => [0, 0b01100, 0b01100, 0, 0b01100, 0b01100, 0],
        '-' => [0, 0, 0, 0b11111, 0, 0, 0],
        '/' => [0, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0],
        '(' => [0b00010, 0b00100, 0b01000, 0b01000, 0b01000, 0b00100, 0b00010],
        ')' => [0b01000, 0b00100, 0b00010, 0b00010, 0b00010, 0b00100, 0b01000],
        ' ' => [0; GLYPH_ROWS],
        _ => BOX,
    }
}

/// Side length of one dot for a given font size.
fn dot_size(size: f32) -> u32 {
    ((size / 10.0).round() as u32).max(1)
}

/// Horizontal advance per character of the built-in face.
pub fn builtin_advance(size: f32) -> u32 {
    dot_size(size) * ADVANCE_COLS
}

fn draw_builtin(canvas: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, size: f32, text: &str) {
    let dot = dot_size(size);
    let mut pen_x = x;
    for c in text.chars() {
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_COLS {
                if bits & (1 << (GLYPH_COLS - 1 - col)) == 0 {
                    continue;
                }
                let px = pen_x + (col * dot) as i32;
                let py = y + (row as u32 * dot) as i32;
                // draw_filled_rect_mut clips to the canvas.
                draw_filled_rect_mut(canvas, Rect::at(px, py).of_size(dot, dot), color);
            }
        }
        pen_x += builtin_advance(size) as i32;
    }
}
