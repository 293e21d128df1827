//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the four operations every backend must
//! support: decode, read_metadata, stamp, and encode. Everything the ledger
//! does to pixels goes through these, so layout logic can be tested with a
//! recording mock instead of real codecs.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust and
//! statically linked.

use super::params::{Quality, StampStyle};
use crate::metadata::PhotoMetadata;
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Trait for image processing backends.
///
/// Backends are shared across rayon workers, hence `Sync`.
pub trait ImageBackend: Sync {
    /// Decode raw file bytes into pixels, ignoring any orientation tag.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError>;

    /// Read orientation and capture date. Never fails: absent or corrupt
    /// metadata yields defaults.
    fn read_metadata(&self, bytes: &[u8]) -> PhotoMetadata;

    /// Burn `text` onto the image. Empty text returns the image untouched.
    fn stamp(&self, image: DynamicImage, text: &str, style: &StampStyle) -> DynamicImage;

    /// Encode as baseline JPEG without metadata.
    fn encode(&self, image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError>;
}
