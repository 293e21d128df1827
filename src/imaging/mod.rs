//! Image processing, pure Rust and statically linked.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` |
//! | **Orientation / capture date** | `kamadak-exif` (see [`crate::metadata`]) |
//! | **Date stamp** | `imageproc` + `ab_glyph`, built-in dot-matrix fallback |
//! | **Encode** | JPEG via `image::codecs::jpeg` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for stamp placement and preview sizing (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Font**: Stamp font fallback chain
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining metadata decisions + backend

pub mod backend;
mod calculations;
pub mod font;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{
    StampOrigin, approx_text_width, fit_within, right_edge_offset, stamp_origin,
};
pub use font::StampFont;
pub use operations::{
    RenderedPhoto, apply_orientation, normalize_orientation, preview, render_photo,
};
pub use params::{Quality, RenderParams, StampStyle};
pub use rust_backend::RustBackend;
