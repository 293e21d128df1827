//! Embedded EXIF metadata lookups.
//!
//! Two fields matter to the ledger:
//!
//! - **Orientation** (`0x0112`): how the camera was held. Phones store the
//!   sensor image unrotated and record the rotation here, so every photo has
//!   to be turned upright before it is stamped and embedded.
//! - **DateTimeOriginal** (`0x9003`): the capture timestamp, formatted
//!   `YYYY:MM:DD HH:MM:SS`. Used when the date stamp mode is "from capture".
//!
//! ## Fallible lookups, recovered callers
//!
//! Each field has an explicit lookup that returns `Result<_, MetadataError>`
//! so the failure paths can be tested one by one. The pipeline never surfaces
//! these errors: [`orientation`] falls back to [`Orientation::Normal`] and
//! [`capture_date`] falls back to `None`, logging the reason at debug level.
//!
//! The container is sniffed by `kamadak-exif`, which understands JPEG, PNG
//! (`eXIf`), TIFF, WebP and HEIF.

use crate::types::LedgerDate;
use chrono::NaiveDateTime;
use exif::{In, Reader, Tag, Value};
use std::fmt;
use std::io::Cursor;
use thiserror::Error;

/// Layout of the EXIF `DateTimeOriginal` field.
pub const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("no EXIF metadata block: {0}")]
    NoMetadata(String),
    #[error("EXIF field {0} is missing")]
    MissingField(&'static str),
    #[error("EXIF field {field} has unparsable value {value:?}")]
    Unparsable { field: &'static str, value: String },
}

/// Rotation needed to display an image upright.
///
/// Only the three pure rotations are acted on. Mirrored variants (2, 4, 5, 7)
/// and out-of-range values are kept as [`Orientation::Other`] and treated as
/// no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Normal,
    /// EXIF 3.
    Rotate180,
    /// EXIF 6: turn 90° clockwise to display.
    Rotate90Cw,
    /// EXIF 8: turn 270° clockwise (90° counter-clockwise) to display.
    Rotate270Cw,
    Other(u32),
}

impl Orientation {
    pub fn from_exif(value: u32) -> Self {
        match value {
            1 => Self::Normal,
            3 => Self::Rotate180,
            6 => Self::Rotate90Cw,
            8 => Self::Rotate270Cw,
            other => Self::Other(other),
        }
    }

    /// Whether applying this orientation turns the image at all.
    pub fn is_rotation(self) -> bool {
        matches!(self, Self::Rotate180 | Self::Rotate90Cw | Self::Rotate270Cw)
    }

    /// Whether width and height trade places after normalization.
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Self::Rotate90Cw | Self::Rotate270Cw)
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "upright"),
            Self::Rotate180 => write!(f, "rotate 180"),
            Self::Rotate90Cw => write!(f, "rotate 90 cw"),
            Self::Rotate270Cw => write!(f, "rotate 90 ccw"),
            Self::Other(v) => write!(f, "tag {v}, ignored"),
        }
    }
}

/// Metadata gathered from one photo in a single pass over its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhotoMetadata {
    pub orientation: Orientation,
    pub capture_date: Option<LedgerDate>,
}

fn read_exif(bytes: &[u8]) -> Result<exif::Exif, MetadataError> {
    Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .map_err(|e| MetadataError::NoMetadata(e.to_string()))
}

fn lookup_orientation(exif: &exif::Exif) -> Result<Orientation, MetadataError> {
    let field = exif
        .get_field(Tag::Orientation, In::PRIMARY)
        .ok_or(MetadataError::MissingField("Orientation"))?;
    field
        .value
        .get_uint(0)
        .map(Orientation::from_exif)
        .ok_or_else(|| MetadataError::Unparsable {
            field: "Orientation",
            value: field.display_value().to_string(),
        })
}

fn lookup_capture_timestamp(exif: &exif::Exif) -> Result<NaiveDateTime, MetadataError> {
    let field = exif
        .get_field(Tag::DateTimeOriginal, In::PRIMARY)
        .ok_or(MetadataError::MissingField("DateTimeOriginal"))?;
    let raw = match &field.value {
        Value::Ascii(parts) => parts
            .first()
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .unwrap_or_default(),
        other => {
            return Err(MetadataError::Unparsable {
                field: "DateTimeOriginal",
                value: format!("{other:?}"),
            });
        }
    };
    NaiveDateTime::parse_from_str(raw.trim_end_matches('\0'), EXIF_DATETIME_FORMAT).map_err(|_| {
        MetadataError::Unparsable {
            field: "DateTimeOriginal",
            value: raw,
        }
    })
}

/// Read the orientation tag.
pub fn read_orientation(bytes: &[u8]) -> Result<Orientation, MetadataError> {
    lookup_orientation(&read_exif(bytes)?)
}

/// Read and parse the original capture timestamp.
pub fn read_capture_timestamp(bytes: &[u8]) -> Result<NaiveDateTime, MetadataError> {
    lookup_capture_timestamp(&read_exif(bytes)?)
}

/// Orientation with every failure resolved to [`Orientation::Normal`].
pub fn orientation(bytes: &[u8]) -> Orientation {
    read_orientation(bytes).unwrap_or_else(|e| {
        tracing::debug!("orientation unavailable, leaving image as is: {e}");
        Orientation::Normal
    })
}

/// Capture date with every failure resolved to `None`.
pub fn capture_date(bytes: &[u8]) -> Option<LedgerDate> {
    match read_capture_timestamp(bytes) {
        Ok(ts) => Some(LedgerDate::new(ts.date())),
        Err(e) => {
            tracing::debug!("capture date unavailable: {e}");
            None
        }
    }
}

/// Read both fields, parsing the EXIF block only once.
pub fn read_photo_metadata(bytes: &[u8]) -> PhotoMetadata {
    let exif = match read_exif(bytes) {
        Ok(exif) => exif,
        Err(e) => {
            tracing::debug!("{e}");
            return PhotoMetadata::default();
        }
    };
    PhotoMetadata {
        orientation: lookup_orientation(&exif).unwrap_or_default(),
        capture_date: lookup_capture_timestamp(&exif)
            .ok()
            .map(|ts| LedgerDate::new(ts.date())),
    }
}
