//! Ledger settings module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults
//! reproduce the standard ledger layout; a user file only needs the keys it
//! wants to change.
//!
//! ## Config File Location
//!
//! `config.toml` is looked up next to the ledger request file. A different
//! file can be passed with `--config`.
//!
//! ```text
//! site-visit/
//! ├── config.toml     # Optional settings (overrides stock defaults)
//! ├── ledger.toml     # The request: customer, date mode, photos
//! └── photos/
//!     ├── 001-toilet.jpg
//!     └── 002-bath.jpg
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [stamp]
//! font_size = 80              # Pixels
//! color = [255, 165, 0]       # RGB
//! right_margin = 100          # Pixels from the right edge
//! bottom_offset = 120         # Pixels above the bottom edge
//! fonts = ["NotoSansJP-Regular.ttf", "DejaVuSans.ttf"]
//!
//! [sheet]
//! sheet_name = "工事写真台帳"
//! paper_size = 9              # 9 = A4
//! column_width = 45           # Character units
//! caption_row_height = 30     # Points
//! image_row_height = 190      # Points
//! image_width = 320           # Pixels
//! image_height = 240          # Pixels
//! font_name = "Meiryo"
//! title_font_size = 14
//! caption_font_size = 11
//!
//! [images]
//! quality = 75                # JPEG quality (1-100)
//! preview_max_edge = 1024     # Longest edge of preview renditions
//!
//! [processing]
//! max_processes = 4           # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Settings loaded from `config.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerSettings {
    /// Date stamp appearance.
    pub stamp: StampConfig,
    /// Spreadsheet layout.
    pub sheet: SheetConfig,
    /// Embedded image encoding and preview size.
    pub images: ImagesConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl LedgerSettings {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images.quality == 0 || self.images.quality > 100 {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.images.preview_max_edge == 0 {
            return Err(ConfigError::Validation(
                "images.preview_max_edge must be non-zero".into(),
            ));
        }
        if self.stamp.font_size == 0 {
            return Err(ConfigError::Validation(
                "stamp.font_size must be non-zero".into(),
            ));
        }
        if self.sheet.column_width == 0 {
            return Err(ConfigError::Validation(
                "sheet.column_width must be non-zero".into(),
            ));
        }
        if self.sheet.image_width == 0 || self.sheet.image_height == 0 {
            return Err(ConfigError::Validation(
                "sheet.image_width and sheet.image_height must be non-zero".into(),
            ));
        }
        if self.sheet.caption_row_height > 409 || self.sheet.image_row_height > 409 {
            return Err(ConfigError::Validation(
                "sheet row heights must not exceed 409 points".into(),
            ));
        }
        let name = &self.sheet.sheet_name;
        if name.is_empty()
            || name.chars().count() > 31
            || name.contains(['[', ']', ':', '*', '?', '/', '\\'])
        {
            return Err(ConfigError::Validation(format!(
                "sheet.sheet_name {name:?} is not a valid worksheet name"
            )));
        }
        Ok(())
    }
}

/// Date stamp appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StampConfig {
    /// Font size in pixels.
    pub font_size: u32,
    /// Text color as `[r, g, b]`.
    pub color: [u8; 3],
    /// Pixels between the estimated text end and the right edge.
    pub right_margin: u32,
    /// Pixels from the bottom edge up to the text.
    pub bottom_offset: u32,
    /// Font files tried in order. Relative paths resolve against the
    /// working directory. When none loads, a built-in face is used.
    pub fonts: Vec<String>,
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            font_size: 80,
            color: [255, 165, 0],
            right_margin: 100,
            bottom_offset: 120,
            fonts: vec![
                "NotoSansJP-Regular.ttf".to_string(),
                "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc".to_string(),
                "C:\\Windows\\Fonts\\meiryo.ttc".to_string(),
                "DejaVuSans.ttf".to_string(),
                "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf".to_string(),
            ],
        }
    }
}

impl StampConfig {
    pub fn font_candidates(&self) -> Vec<PathBuf> {
        self.fonts.iter().map(PathBuf::from).collect()
    }
}

/// Spreadsheet layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheetConfig {
    pub sheet_name: String,
    /// Excel paper size code (9 = A4).
    pub paper_size: u8,
    /// Width of columns A and B in character units.
    pub column_width: u32,
    pub caption_row_height: u32,
    pub image_row_height: u32,
    /// Displayed image box; photos are stretched to fill it.
    pub image_width: u32,
    pub image_height: u32,
    pub font_name: String,
    pub title_font_size: u32,
    pub caption_font_size: u32,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            sheet_name: "工事写真台帳".to_string(),
            paper_size: 9,
            column_width: 45,
            caption_row_height: 30,
            image_row_height: 190,
            image_width: 320,
            image_height: 240,
            font_name: "Meiryo".to_string(),
            title_font_size: 14,
            caption_font_size: 11,
        }
    }
}

/// Embedded image encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// JPEG quality (1 = worst, 100 = best).
    pub quality: u32,
    /// Longest edge of preview renditions, in pixels.
    pub preview_max_edge: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            quality: 75,
            preview_max_edge: 1024,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel photo workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(LedgerSettings::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<LedgerSettings, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: LedgerSettings = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `config.toml` from the given directory, on top of stock defaults.
pub fn load_config(dir: &Path) -> Result<LedgerSettings, ConfigError> {
    load_config_file(&dir.join("config.toml"))
}

/// Load an explicit config file, on top of stock defaults.
///
/// A missing file yields the defaults.
pub fn load_config_file(path: &Path) -> Result<LedgerSettings, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Photo Ledger Configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file next to ledger.toml, or pass --config <file>.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Date stamp burned into each photo
# ---------------------------------------------------------------------------
[stamp]
# Font size in pixels.
font_size = 80

# Text color as [r, g, b].
color = [255, 165, 0]

# The stamp is right-aligned using an estimated width of
# characters x font_size / 2, then shifted left by this many pixels.
right_margin = 100

# Distance from the bottom edge up to the text, in pixels.
bottom_offset = 120

# Font files tried in order. The first that loads is used; if none does,
# a built-in face is used instead.
fonts = [
    "NotoSansJP-Regular.ttf",
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "C:\\Windows\\Fonts\\meiryo.ttc",
    "DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
]

# ---------------------------------------------------------------------------
# Spreadsheet layout
# ---------------------------------------------------------------------------
[sheet]
sheet_name = "工事写真台帳"

# Excel paper size code. 9 = A4.
paper_size = 9

# Width of the two photo columns, in character units.
column_width = 45

# Row heights in points.
caption_row_height = 30
image_row_height = 190

# Displayed size of each photo in pixels. Photos are stretched to this box.
image_width = 320
image_height = 240

font_name = "Meiryo"
title_font_size = 14
caption_font_size = 11

# ---------------------------------------------------------------------------
# Image encoding
# ---------------------------------------------------------------------------
[images]
# JPEG quality for embedded photos (1 = worst, 100 = best).
quality = 75

# Longest edge of preview renditions written by `photo-ledger preview`.
preview_max_edge = 1024

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel photo workers. Omit to use all CPU cores.
# max_processes = 4
"##
}
