//! Ledger layout engine.
//!
//! Stage 2 of the ledger pipeline. Takes the ordered photo entries, renders
//! each one (upright, stamped, re-encoded) and assigns it a slot in the
//! two-column grid the document stage writes out.
//!
//! ## Grid
//!
//! ```text
//!        A                 B
//!   1  title
//!   2  ① caption          ② caption        ← caption row (30pt)
//!   3  [photo 0]          [photo 1]        ← image row (190pt)
//!   4  ③ caption
//!   5  [photo 2]
//! ```
//!
//! Entry `i` lands on caption row `2 + 2*(i/2)`, left column when `i` is
//! even. Rows are 1-based to match what a spreadsheet shows.
//!
//! ## Parallel Processing
//!
//! Photos are rendered in parallel with [rayon](https://docs.rs/rayon); the
//! results are collected back into upload order before slots are assigned,
//! so the grid never depends on scheduling.

use crate::imaging::{BackendError, ImageBackend, RenderParams, render_photo};
use crate::ledger::LedgerEvent;
use crate::types::{DateStampMode, LedgerConfiguration, LedgerDate, PhotoEntry};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::sync::mpsc::Sender;
use thiserror::Error;

/// One of the two photo columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Column {
    Left,
    Right,
}

impl Column {
    /// Spreadsheet column letter.
    pub fn letter(self) -> char {
        match self {
            Column::Left => 'A',
            Column::Right => 'B',
        }
    }

    /// Zero-based column index.
    pub fn index(self) -> u16 {
        match self {
            Column::Left => 0,
            Column::Right => 1,
        }
    }
}

/// Grid position of one photo: the caption row and the column.
/// The image sits on the row directly below the caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GridSlot {
    /// 1-based caption row.
    pub row: u32,
    pub column: Column,
}

impl GridSlot {
    /// Slot for the entry at 0-based position `index`.
    pub fn for_index(index: usize) -> Self {
        let row = 2 + 2 * (index / 2) as u32;
        let column = if index % 2 == 0 {
            Column::Left
        } else {
            Column::Right
        };
        Self { row, column }
    }

    pub fn caption_row(self) -> u32 {
        self.row
    }

    pub fn image_row(self) -> u32 {
        self.row + 1
    }

    /// Cell reference of the caption, e.g. `B4`.
    pub fn caption_cell(self) -> String {
        format!("{}{}", self.column.letter(), self.caption_row())
    }

    /// Cell reference of the image, e.g. `B5`.
    pub fn image_cell(self) -> String {
        format!("{}{}", self.column.letter(), self.image_row())
    }
}

impl fmt::Display for GridSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.caption_cell(), self.image_cell())
    }
}

/// Number of grid rows (caption + image pairs) `count` photos occupy.
pub fn rows_used(count: usize) -> usize {
    count.div_ceil(2)
}

/// Caption cell text.
pub fn caption(number: &str, content: &str) -> String {
    format!("{number} {content}")
}

/// Decide which text, if any, is stamped on one photo.
pub fn resolve_stamp_text(mode: &DateStampMode, capture_date: Option<LedgerDate>) -> Option<String> {
    match mode {
        DateStampMode::Fixed(date) => Some(date.to_string()),
        DateStampMode::FromCapture => capture_date.map(|d| d.to_string()),
        DateStampMode::None => None,
    }
}

/// A rendered photo bound to its slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub slot: GridSlot,
    pub caption: String,
    /// Upright, stamped JPEG bytes without metadata.
    pub image: Vec<u8>,
    /// Upload index of the entry this came from.
    pub source_index: usize,
    pub stamp_text: Option<String>,
    pub width: u32,
    pub height: u32,
}

/// A photo that could not be rendered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("photo {} ({caption}): {source}", .index + 1)]
pub struct EntryFailure {
    /// Upload index of the failed entry.
    pub index: usize,
    pub caption: String,
    #[source]
    pub source: BackendError,
}

/// What to do when a photo cannot be decoded or encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Record the failure and lay out the remaining photos.
    #[default]
    Skip,
    /// Stop at the first failing photo in upload order.
    Abort,
}

/// Result of the layout stage.
#[derive(Debug, Clone, Default)]
pub struct LayoutPlan {
    /// Kept photos in upload order, slots packed without gaps.
    pub placements: Vec<Placement>,
    /// Skipped photos in upload order.
    pub failures: Vec<EntryFailure>,
}

impl LayoutPlan {
    pub fn rows_used(&self) -> usize {
        rows_used(self.placements.len())
    }
}

struct Rendered {
    caption: String,
    stamp_text: Option<String>,
    jpeg: Vec<u8>,
    width: u32,
    height: u32,
}

fn render_entry(
    entry: &PhotoEntry,
    mode: &DateStampMode,
    backend: &impl ImageBackend,
    params: &RenderParams,
) -> Result<Rendered, EntryFailure> {
    let caption = caption(&entry.number, &entry.content);
    let meta = backend.read_metadata(&entry.bytes);
    let stamp_text = resolve_stamp_text(mode, meta.capture_date);
    match render_photo(backend, &entry.bytes, &meta, stamp_text.as_deref(), params) {
        Ok(photo) => Ok(Rendered {
            caption,
            stamp_text,
            jpeg: photo.jpeg,
            width: photo.width,
            height: photo.height,
        }),
        Err(source) => Err(EntryFailure {
            index: entry.index,
            caption,
            source,
        }),
    }
}

/// Render every entry and assign grid slots.
///
/// Entries are processed in parallel and reordered to upload order. With
/// [`FailurePolicy::Abort`] the earliest failing entry is returned as the
/// error; with [`FailurePolicy::Skip`] failures are collected and the kept
/// placements are packed into consecutive slots.
pub fn plan(
    entries: &[PhotoEntry],
    config: &LedgerConfiguration,
    backend: &impl ImageBackend,
    params: &RenderParams,
    policy: FailurePolicy,
    events: Option<&Sender<LedgerEvent>>,
) -> Result<LayoutPlan, EntryFailure> {
    let mode = config.date_stamp;
    let results: Vec<(usize, Result<Rendered, EntryFailure>)> = entries
        .par_iter()
        .map(|entry| (entry.index, render_entry(entry, &mode, backend, params)))
        .collect();

    let mut layout = LayoutPlan::default();
    for (source_index, result) in results {
        match result {
            Ok(rendered) => {
                let slot = GridSlot::for_index(layout.placements.len());
                tracing::debug!(
                    index = source_index,
                    slot = %slot,
                    width = rendered.width,
                    height = rendered.height,
                    "placed photo"
                );
                if let Some(tx) = events {
                    tx.send(LedgerEvent::EntryRendered {
                        index: source_index,
                        slot,
                        caption: rendered.caption.clone(),
                        stamp_text: rendered.stamp_text.clone(),
                        width: rendered.width,
                        height: rendered.height,
                    })
                    .ok();
                }
                layout.placements.push(Placement {
                    slot,
                    caption: rendered.caption,
                    image: rendered.jpeg,
                    source_index,
                    stamp_text: rendered.stamp_text,
                    width: rendered.width,
                    height: rendered.height,
                });
            }
            Err(failure) => {
                if policy == FailurePolicy::Abort {
                    return Err(failure);
                }
                tracing::warn!(index = failure.index, error = %failure.source, "skipping photo");
                if let Some(tx) = events {
                    tx.send(LedgerEvent::EntrySkipped {
                        index: failure.index,
                        caption: failure.caption.clone(),
                        reason: failure.source.to_string(),
                    })
                    .ok();
                }
                layout.failures.push(failure);
            }
        }
    }
    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp, mock_bytes};
    use crate::test_helpers::entry;
    use std::sync::mpsc;

    fn slot(row: u32, column: Column) -> GridSlot {
        GridSlot { row, column }
    }

    fn date(y: i32, m: u32, d: u32) -> LedgerDate {
        LedgerDate::from_ymd(y, m, d).unwrap()
    }

    fn config(mode: DateStampMode) -> LedgerConfiguration {
        LedgerConfiguration {
            customer_name: None,
            date_stamp: mode,
        }
    }

    fn mock_entries(widths: &[u8]) -> Vec<PhotoEntry> {
        widths
            .iter()
            .enumerate()
            .map(|(i, &w)| entry(i, mock_bytes(w, 10, 1)))
            .collect()
    }

    fn stamp_texts(ops: &[RecordedOp]) -> Vec<String> {
        let mut texts: Vec<String> = ops
            .iter()
            .filter_map(|op| match op {
                RecordedOp::Stamp { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect();
        texts.sort();
        texts
    }

    // =========================================================================
    // Grid slots
    // =========================================================================

    #[test]
    fn five_entries_pack_row_major() {
        let slots: Vec<GridSlot> = (0..5).map(GridSlot::for_index).collect();
        assert_eq!(
            slots,
            vec![
                slot(2, Column::Left),
                slot(2, Column::Right),
                slot(4, Column::Left),
                slot(4, Column::Right),
                slot(6, Column::Left),
            ]
        );
    }

    #[test]
    fn slots_never_collide() {
        let slots: std::collections::HashSet<GridSlot> =
            (0..200).map(GridSlot::for_index).collect();
        assert_eq!(slots.len(), 200);
    }

    #[test]
    fn caption_row_is_even_and_image_row_follows() {
        for i in 0..50 {
            let s = GridSlot::for_index(i);
            assert_eq!(s.caption_row() % 2, 0);
            assert_eq!(s.image_row(), s.caption_row() + 1);
        }
    }

    #[test]
    fn cell_references() {
        let s = GridSlot::for_index(3);
        assert_eq!(s.caption_cell(), "B4");
        assert_eq!(s.image_cell(), "B5");
        assert_eq!(s.to_string(), "B4/B5");
        assert_eq!(Column::Left.index(), 0);
        assert_eq!(Column::Right.letter(), 'B');
    }

    #[test]
    fn rows_used_is_ceiling_of_half() {
        assert_eq!(rows_used(0), 0);
        assert_eq!(rows_used(1), 1);
        assert_eq!(rows_used(2), 1);
        assert_eq!(rows_used(3), 2);
        assert_eq!(rows_used(5), 3);
    }

    #[test]
    fn caption_uses_single_space() {
        assert_eq!(caption("①", "トイレ手すり取り付け"), "① トイレ手すり取り付け");
    }

    // =========================================================================
    // Stamp text resolution
    // =========================================================================

    #[test]
    fn fixed_mode_ignores_capture_date() {
        let mode = DateStampMode::Fixed(date(2024, 6, 1));
        assert_eq!(
            resolve_stamp_text(&mode, Some(date(2020, 1, 1))),
            Some("2024.06.01".to_string())
        );
    }

    #[test]
    fn capture_mode_uses_capture_date() {
        assert_eq!(
            resolve_stamp_text(&DateStampMode::FromCapture, Some(date(2024, 5, 1))),
            Some("2024.05.01".to_string())
        );
        assert_eq!(resolve_stamp_text(&DateStampMode::FromCapture, None), None);
    }

    #[test]
    fn none_mode_never_stamps() {
        assert_eq!(
            resolve_stamp_text(&DateStampMode::None, Some(date(2024, 5, 1))),
            None
        );
    }

    // =========================================================================
    // Planning
    // =========================================================================

    #[test]
    fn plan_preserves_upload_order() {
        let backend = MockBackend::new();
        let entries = mock_entries(&[11, 12, 13, 14, 15]);
        let layout = plan(
            &entries,
            &config(DateStampMode::None),
            &backend,
            &RenderParams::default(),
            FailurePolicy::Skip,
            None,
        )
        .unwrap();

        assert!(layout.failures.is_empty());
        assert_eq!(layout.rows_used(), 3);
        let widths: Vec<u8> = layout.placements.iter().map(|p| p.image[0]).collect();
        assert_eq!(widths, vec![11, 12, 13, 14, 15]);
        let slots: Vec<GridSlot> = layout.placements.iter().map(|p| p.slot).collect();
        let expected: Vec<GridSlot> = (0..5).map(GridSlot::for_index).collect();
        assert_eq!(slots, expected);
        assert_eq!(layout.placements[2].caption, "(3) トイレ手すり取り付け");
    }

    #[test]
    fn plan_fixed_date_stamps_every_photo() {
        let backend = MockBackend::new();
        let entries = mock_entries(&[20, 21, 22]);
        let layout = plan(
            &entries,
            &config(DateStampMode::Fixed(date(2024, 6, 1))),
            &backend,
            &RenderParams::default(),
            FailurePolicy::Skip,
            None,
        )
        .unwrap();

        assert!(
            layout
                .placements
                .iter()
                .all(|p| p.stamp_text.as_deref() == Some("2024.06.01"))
        );
        assert_eq!(stamp_texts(&backend.get_operations()).len(), 3);
    }

    #[test]
    fn plan_capture_mode_stamps_only_dated_photos() {
        let backend = MockBackend::new().with_capture_date(30, date(2024, 5, 1));
        let entries = mock_entries(&[30, 31]);
        let layout = plan(
            &entries,
            &config(DateStampMode::FromCapture),
            &backend,
            &RenderParams::default(),
            FailurePolicy::Skip,
            None,
        )
        .unwrap();

        assert_eq!(layout.placements[0].stamp_text.as_deref(), Some("2024.05.01"));
        assert_eq!(layout.placements[1].stamp_text, None);
        assert_eq!(stamp_texts(&backend.get_operations()), vec!["2024.05.01"]);
    }

    #[test]
    fn plan_reads_metadata_once_per_photo() {
        let backend = MockBackend::new().with_capture_date(30, date(2024, 5, 1));
        let entries = mock_entries(&[30, 31, 32]);
        plan(
            &entries,
            &config(DateStampMode::FromCapture),
            &backend,
            &RenderParams::default(),
            FailurePolicy::Skip,
            None,
        )
        .unwrap();

        let reads = backend
            .get_operations()
            .iter()
            .filter(|op| matches!(op, RecordedOp::ReadMetadata))
            .count();
        assert_eq!(reads, 3);
    }

    #[test]
    fn plan_skips_broken_photo_without_leaving_a_hole() {
        let backend = MockBackend::new();
        let entries = vec![
            entry(0, mock_bytes(40, 10, 1)),
            entry(1, vec![0]),
            entry(2, mock_bytes(42, 10, 1)),
        ];
        let layout = plan(
            &entries,
            &config(DateStampMode::None),
            &backend,
            &RenderParams::default(),
            FailurePolicy::Skip,
            None,
        )
        .unwrap();

        assert_eq!(layout.placements.len(), 2);
        assert_eq!(layout.placements[1].source_index, 2);
        assert_eq!(layout.placements[1].slot, slot(2, Column::Right));
        assert_eq!(layout.failures.len(), 1);
        assert_eq!(layout.failures[0].index, 1);
        assert!(matches!(layout.failures[0].source, BackendError::Decode(_)));
    }

    #[test]
    fn plan_abort_returns_earliest_failure() {
        let backend = MockBackend::new();
        let entries = vec![
            entry(0, mock_bytes(40, 10, 1)),
            entry(1, vec![0]),
            entry(2, vec![]),
        ];
        let failure = plan(
            &entries,
            &config(DateStampMode::None),
            &backend,
            &RenderParams::default(),
            FailurePolicy::Abort,
            None,
        )
        .unwrap_err();

        assert_eq!(failure.index, 1);
        assert!(failure.to_string().starts_with("photo 2 ((2) "));
    }

    #[test]
    fn plan_rotates_before_stamping() {
        let backend = MockBackend::new();
        let entries = vec![entry(0, mock_bytes(60, 40, 6))];
        let layout = plan(
            &entries,
            &config(DateStampMode::Fixed(date(2024, 6, 1))),
            &backend,
            &RenderParams::default(),
            FailurePolicy::Skip,
            None,
        )
        .unwrap();

        assert_eq!((layout.placements[0].width, layout.placements[0].height), (40, 60));
        assert!(backend.get_operations().contains(&RecordedOp::Stamp {
            width: 40,
            height: 60,
            text: "2024.06.01".into()
        }));
    }

    #[test]
    fn plan_empty_input() {
        let layout = plan(
            &[],
            &LedgerConfiguration::default(),
            &MockBackend::new(),
            &RenderParams::default(),
            FailurePolicy::Abort,
            None,
        )
        .unwrap();
        assert!(layout.placements.is_empty());
        assert_eq!(layout.rows_used(), 0);
    }

    #[test]
    fn plan_emits_events_in_upload_order() {
        let (tx, rx) = mpsc::channel();
        let entries = vec![
            entry(0, mock_bytes(40, 10, 1)),
            entry(1, vec![0]),
            entry(2, mock_bytes(42, 10, 1)),
        ];
        plan(
            &entries,
            &LedgerConfiguration::default(),
            &MockBackend::new(),
            &RenderParams::default(),
            FailurePolicy::Skip,
            Some(&tx),
        )
        .unwrap();
        drop(tx);

        let indices: Vec<(usize, bool)> = rx
            .iter()
            .map(|event| match event {
                LedgerEvent::EntryRendered { index, .. } => (index, true),
                LedgerEvent::EntrySkipped { index, .. } => (index, false),
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(indices, vec![(0, true), (1, false), (2, true)]);
    }
}
