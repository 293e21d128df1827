//! Ledger request files.
//!
//! Stage 1 of the ledger pipeline. The command-line shell describes one
//! ledger in a small TOML file and this module turns it into a
//! [`LedgerRequest`]: photo bytes read from disk, labels filled in.
//!
//! ## Request File
//!
//! ```toml
//! customer = "山田 太郎"          # optional
//!
//! [date_stamp]
//! mode = "fixed"                 # "fixed" (default), "capture" or "none"
//! date = "2024-06-01"            # fixed mode only; defaults to the build date
//!
//! [[photos]]
//! path = "photos/001-toilet.jpg" # relative to this file
//! number = "①"                   # optional: circled numeral by position
//! content = "トイレ手すり取り付け"  # optional: title from the filename
//! ```
//!
//! Photos appear in the ledger in the order they are listed.
//!
//! ## Default Labels
//!
//! A photo without a `number` gets the circled numeral for its position
//! (①, ②, ... then `(21)`), and one without `content` gets the title of its
//! `NNN-name` filename. An interactive form instead pre-fills every photo
//! with `①` and `トイレ手すり取り付け` and expects the user to edit them; a
//! request file has no editing step, so the defaults are derived per photo.

use crate::layout::FailurePolicy;
use crate::ledger::LedgerRequest;
use crate::naming::{circled_number, parse_entry_name};
use crate::types::{DateStampMode, LedgerConfiguration, LedgerDate, PhotoEntry};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid request file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Photo not found: {0}")]
    PhotoNotFound(PathBuf),
    #[error("Invalid date {0:?} (expected YYYY-MM-DD)")]
    InvalidDate(String),
    #[error("date_stamp.date is only allowed with mode = \"fixed\"")]
    DateWithoutFixedMode,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RequestFile {
    #[serde(default)]
    customer: Option<String>,
    #[serde(default)]
    date_stamp: DateStampSection,
    #[serde(default)]
    photos: Vec<PhotoSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DateStampSection {
    #[serde(default)]
    mode: StampModeName,
    date: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum StampModeName {
    #[default]
    Fixed,
    Capture,
    None,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct PhotoSection {
    path: PathBuf,
    number: Option<String>,
    content: Option<String>,
}

/// A loaded request plus where each photo came from.
#[derive(Debug, Clone)]
pub struct Intake {
    pub request: LedgerRequest,
    /// Resolved path of each entry, parallel to `request.entries`.
    pub sources: Vec<PathBuf>,
}

fn parse_date(raw: &str) -> Result<LedgerDate, IntakeError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map(LedgerDate::new)
        .map_err(|_| IntakeError::InvalidDate(raw.to_string()))
}

fn resolve_mode(section: &DateStampSection, today: LedgerDate) -> Result<DateStampMode, IntakeError> {
    match (section.mode, &section.date) {
        (StampModeName::Fixed, Some(raw)) => Ok(DateStampMode::Fixed(parse_date(raw)?)),
        (StampModeName::Fixed, None) => Ok(DateStampMode::Fixed(today)),
        (_, Some(_)) => Err(IntakeError::DateWithoutFixedMode),
        (StampModeName::Capture, None) => Ok(DateStampMode::FromCapture),
        (StampModeName::None, None) => Ok(DateStampMode::None),
    }
}

/// Caption content derived from a photo's filename.
pub fn default_content(path: &Path) -> String {
    path.file_stem()
        .map(|stem| parse_entry_name(&stem.to_string_lossy()).display_title)
        .unwrap_or_default()
}

/// Parse request text. Photo paths are resolved against `base_dir` and read.
pub fn parse_request(
    content: &str,
    base_dir: &Path,
    today: LedgerDate,
) -> Result<Intake, IntakeError> {
    let file: RequestFile = toml::from_str(content)?;
    let date_stamp = resolve_mode(&file.date_stamp, today)?;

    let mut entries = Vec::with_capacity(file.photos.len());
    let mut sources = Vec::with_capacity(file.photos.len());
    for (index, photo) in file.photos.into_iter().enumerate() {
        let path = base_dir.join(&photo.path);
        if !path.is_file() {
            return Err(IntakeError::PhotoNotFound(path));
        }
        let bytes = fs::read(&path).map_err(|source| IntakeError::Io {
            path: path.clone(),
            source,
        })?;
        let number = photo.number.unwrap_or_else(|| circled_number(index));
        let content = photo.content.unwrap_or_else(|| default_content(&path));
        tracing::debug!(index, path = %path.display(), bytes = bytes.len(), "read photo");
        entries.push(PhotoEntry::new(index, bytes, number, content));
        sources.push(path);
    }

    Ok(Intake {
        request: LedgerRequest {
            entries,
            config: LedgerConfiguration {
                customer_name: file.customer,
                date_stamp,
            },
            policy: FailurePolicy::default(),
        },
        sources,
    })
}

/// Load a request file from disk.
pub fn load_request(path: &Path, today: LedgerDate) -> Result<Intake, IntakeError> {
    let content = fs::read_to_string(path).map_err(|source| IntakeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_request(&content, base_dir, today)
}
