//! # Photo Ledger
//!
//! Builds construction photo ledgers (工事写真台帳): a set of site photos,
//! each with a short label, laid out two per row in a single-sheet xlsx
//! workbook ready to send to a contractor for a quotation.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! ```text
//! 1. Intake    ledger.toml + photos  →  LedgerRequest     (files → entries)
//! 2. Layout    entries + config      →  LayoutPlan        (rotate, stamp, place)
//! 3. Assemble  placements + config   →  RenderedArtifact  (xlsx bytes)
//! ```
//!
//! Stages 2 and 3 are pure functions of their input and hold everything in
//! memory. Only the intake stage and the command-line shell touch the
//! filesystem, so the core can be driven from any front end.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`intake`] | Stage 1: reads a ledger request file and the photos it lists |
//! | [`layout`] | Stage 2: renders photos in parallel and assigns grid slots |
//! | [`document`] | Stage 3: writes the xlsx workbook |
//! | [`ledger`] | Request/response orchestration and progress events |
//! | [`config`] | `config.toml` loading, validation, and merging over stock defaults |
//! | [`types`] | Entries, dates, and per-build options shared between stages |
//! | [`naming`] | `NNN-name` filename convention and default label numbers |
//! | [`metadata`] | EXIF orientation and capture date lookups |
//! | [`imaging`] | Pure-Rust image operations: orientation, date stamp, JPEG encode |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Rotation Decision
//!
//! Phones record rotation in EXIF instead of rotating pixels. Previews and the
//! final render both go through [`imaging::normalize_orientation`] on the
//! untouched upload bytes, so a photo that looks upright in a preview is
//! upright in the ledger.
//!
//! ## Approximate Stamp Placement
//!
//! The date stamp is right-aligned using `characters × font_size / 2` as the
//! text width rather than measured glyph extents. Ledgers produced so far use
//! this placement and it is kept as is; see
//! [`imaging::approx_text_width`].
//!
//! ## Per-Photo Failures
//!
//! Unreadable metadata is never an error: no tag means no rotation and no
//! capture date. An undecodable photo is reported per entry and, by default,
//! skipped; the remaining photos close ranks so the grid has no holes.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, EXIF parsing, text drawing and JPEG encoding are all pure Rust
//! (`image`, `kamadak-exif`, `imageproc`, `ab_glyph`). When no configured
//! font file is available, a built-in dot-matrix face draws the date, so a
//! build never fails for lack of fonts.

pub mod config;
pub mod document;
pub mod imaging;
pub mod intake;
pub mod layout;
pub mod ledger;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
