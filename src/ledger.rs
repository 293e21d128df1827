//! Request/response orchestration.
//!
//! One [`LedgerRequest`] in, one [`LedgerBuild`] out. The request carries
//! everything the build needs; nothing is kept between builds.
//!
//! ```text
//! LedgerRequest ──▶ layout::plan ──▶ document::assemble ──▶ LedgerBuild
//!                       │                    │
//!                       └──── LedgerEvent ───┴──▶ Sender (optional)
//! ```
//!
//! Progress events are sent over an optional `mpsc` channel so a shell can
//! print them while the build runs. Layout events arrive in upload order.

use crate::config::LedgerSettings;
use crate::document::{self, DocumentError, RenderedArtifact};
use crate::imaging::operations::decode_upright;
use crate::imaging::{ImageBackend, RenderParams, RustBackend};
use crate::layout::{self, EntryFailure, FailurePolicy, GridSlot};
use crate::types::{DateStampMode, LedgerConfiguration, LedgerDate, PhotoEntry};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Photo could not be processed: {0}")]
    Entry(#[from] EntryFailure),
    #[error("Document assembly failed: {0}")]
    Document(#[from] DocumentError),
}

/// Everything one build needs.
#[derive(Debug, Clone, Default)]
pub struct LedgerRequest {
    /// Photos in upload order.
    pub entries: Vec<PhotoEntry>,
    pub config: LedgerConfiguration,
    pub policy: FailurePolicy,
}

/// The result of a successful build.
#[derive(Debug, Clone)]
pub struct LedgerBuild {
    pub artifact: RenderedArtifact,
    /// Suggested download name, dated with the build date.
    pub filename: String,
    /// Photos left out of the ledger.
    pub failures: Vec<EntryFailure>,
}

/// Progress events emitted during a build.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerEvent {
    Started {
        entry_count: usize,
        title: String,
        date_stamp: DateStampMode,
    },
    EntryRendered {
        index: usize,
        slot: GridSlot,
        caption: String,
        stamp_text: Option<String>,
        width: u32,
        height: u32,
    },
    EntrySkipped {
        index: usize,
        caption: String,
        reason: String,
    },
    Assembled {
        filename: String,
        image_count: usize,
        rows_used: usize,
        bytes: usize,
    },
}

/// Build a ledger with the production backend.
///
/// The stamp font is loaded once from `settings.stamp.fonts`.
pub fn build_ledger(
    request: &LedgerRequest,
    settings: &LedgerSettings,
    today: LedgerDate,
    events: Option<Sender<LedgerEvent>>,
) -> Result<LedgerBuild, LedgerError> {
    let backend = RustBackend::with_font_candidates(&settings.stamp.font_candidates());
    tracing::debug!(font = %backend.font().describe(), "stamp font");
    build_ledger_with_backend(request, settings, today, &backend, events)
}

/// Build a ledger with a specific backend.
pub fn build_ledger_with_backend(
    request: &LedgerRequest,
    settings: &LedgerSettings,
    today: LedgerDate,
    backend: &impl ImageBackend,
    events: Option<Sender<LedgerEvent>>,
) -> Result<LedgerBuild, LedgerError> {
    let send = |event: LedgerEvent| {
        if let Some(tx) = &events {
            tx.send(event).ok();
        }
    };

    send(LedgerEvent::Started {
        entry_count: request.entries.len(),
        title: document::title_text(request.config.customer()),
        date_stamp: request.config.date_stamp,
    });

    let params = RenderParams::from_config(&settings.stamp, &settings.images);
    let plan = layout::plan(
        &request.entries,
        &request.config,
        backend,
        &params,
        request.policy,
        events.as_ref(),
    )?;

    let artifact = document::assemble(&plan.placements, &request.config, &settings.sheet)?;
    let filename = document::suggested_filename(today);

    tracing::info!(
        photos = artifact.image_count,
        skipped = plan.failures.len(),
        rows = artifact.rows_used,
        "ledger built"
    );
    send(LedgerEvent::Assembled {
        filename: filename.clone(),
        image_count: artifact.image_count,
        rows_used: artifact.rows_used,
        bytes: artifact.bytes.len(),
    });

    Ok(LedgerBuild {
        artifact,
        filename,
        failures: plan.failures,
    })
}

// =============================================================================
// Dry run
// =============================================================================

/// What a build would do with one photo, without encoding anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryReport {
    pub index: usize,
    pub caption: String,
    /// Slot the photo would occupy; `None` when it would be skipped.
    pub slot: Option<GridSlot>,
    pub orientation: String,
    pub capture_date: Option<String>,
    pub stamp_text: Option<String>,
    /// Upright dimensions.
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub error: Option<String>,
}

/// Decode every photo and report orientation, dates and slots.
///
/// Slots are assigned the same way [`FailurePolicy::Skip`] assigns them.
pub fn survey(
    entries: &[PhotoEntry],
    config: &LedgerConfiguration,
    backend: &impl ImageBackend,
) -> Vec<EntryReport> {
    let mut reports: Vec<EntryReport> = entries
        .par_iter()
        .map(|entry| {
            let meta = backend.read_metadata(&entry.bytes);
            let decoded = decode_upright(backend, &entry.bytes, meta.orientation);
            let (width, height, error) = match decoded {
                Ok(img) => (Some(img.width()), Some(img.height()), None),
                Err(e) => (None, None, Some(e.to_string())),
            };
            EntryReport {
                index: entry.index,
                caption: layout::caption(&entry.number, &entry.content),
                slot: None,
                orientation: meta.orientation.to_string(),
                capture_date: meta.capture_date.map(|d| d.to_string()),
                stamp_text: layout::resolve_stamp_text(&config.date_stamp, meta.capture_date),
                width,
                height,
                error,
            }
        })
        .collect();

    let mut position = 0;
    for report in reports.iter_mut().filter(|r| r.error.is_none()) {
        report.slot = Some(GridSlot::for_index(position));
        position += 1;
    }
    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, mock_bytes};
    use crate::layout::Column;
    use crate::test_helpers::{entry, jpeg_bytes};
    use std::sync::mpsc;

    fn today() -> LedgerDate {
        LedgerDate::from_ymd(2024, 6, 1).unwrap()
    }

    fn request(entries: Vec<PhotoEntry>, policy: FailurePolicy) -> LedgerRequest {
        LedgerRequest {
            entries,
            config: LedgerConfiguration {
                customer_name: Some("山田 太郎".into()),
                date_stamp: DateStampMode::Fixed(today()),
            },
            policy,
        }
    }

    fn real_entries(count: usize) -> Vec<PhotoEntry> {
        (0..count)
            .map(|i| entry(i, jpeg_bytes(120, 90, [40 + 60 * i as u8, 90, 90])))
            .collect()
    }

    #[test]
    fn build_returns_artifact_and_dated_filename() {
        let build = build_ledger_with_backend(
            &request(real_entries(3), FailurePolicy::Skip),
            &LedgerSettings::default(),
            today(),
            &RustBackend::new(),
            None,
        )
        .unwrap();

        assert_eq!(build.filename, "工事写真台帳_20240601.xlsx");
        assert_eq!(build.artifact.image_count, 3);
        assert_eq!(build.artifact.rows_used, 2);
        assert!(build.failures.is_empty());
        assert!(build.artifact.bytes.starts_with(b"PK"));
    }

    #[test]
    fn build_skips_broken_photo() {
        let mut entries = real_entries(3);
        entries[1].bytes = b"broken".to_vec();
        let build = build_ledger_with_backend(
            &request(entries, FailurePolicy::Skip),
            &LedgerSettings::default(),
            today(),
            &RustBackend::new(),
            None,
        )
        .unwrap();

        assert_eq!(build.artifact.image_count, 2);
        assert_eq!(build.artifact.rows_used, 1);
        assert_eq!(build.failures.len(), 1);
        assert_eq!(build.failures[0].index, 1);
    }

    #[test]
    fn build_aborts_on_broken_photo() {
        let mut entries = real_entries(2);
        entries[0].bytes = b"broken".to_vec();
        let result = build_ledger_with_backend(
            &request(entries, FailurePolicy::Abort),
            &LedgerSettings::default(),
            today(),
            &RustBackend::new(),
            None,
        );
        assert!(matches!(result, Err(LedgerError::Entry(ref f)) if f.index == 0));
    }

    #[test]
    fn build_emits_started_entries_and_assembled() {
        let (tx, rx) = mpsc::channel();
        build_ledger_with_backend(
            &request(real_entries(2), FailurePolicy::Skip),
            &LedgerSettings::default(),
            today(),
            &RustBackend::new(),
            Some(tx),
        )
        .unwrap();

        let events: Vec<LedgerEvent> = rx.iter().collect();
        assert_eq!(events.len(), 4);
        assert_eq!(
            events[0],
            LedgerEvent::Started {
                entry_count: 2,
                title: "山田 太郎　施工前写真".into(),
                date_stamp: DateStampMode::Fixed(today()),
            }
        );
        assert!(matches!(
            &events[1],
            LedgerEvent::EntryRendered { index: 0, stamp_text: Some(t), .. } if t == "2024.06.01"
        ));
        assert!(matches!(events[2], LedgerEvent::EntryRendered { index: 1, .. }));
        assert!(matches!(
            &events[3],
            LedgerEvent::Assembled { image_count: 2, rows_used: 1, .. }
        ));
    }

    #[test]
    fn build_with_no_entries_still_produces_title_sheet() {
        let build = build_ledger_with_backend(
            &LedgerRequest::default(),
            &LedgerSettings::default(),
            today(),
            &RustBackend::new(),
            None,
        )
        .unwrap();
        assert_eq!(build.artifact.image_count, 0);
        assert!(!build.artifact.bytes.is_empty());
    }

    #[test]
    fn build_ledger_uses_builtin_font_when_none_configured() {
        let mut settings = LedgerSettings::default();
        settings.stamp.fonts.clear();
        let build = build_ledger(
            &request(real_entries(1), FailurePolicy::Abort),
            &settings,
            today(),
            None,
        )
        .unwrap();
        assert_eq!(build.artifact.image_count, 1);
    }

    // =========================================================================
    // Survey
    // =========================================================================

    #[test]
    fn survey_reports_upright_dimensions_and_slots() {
        let backend = MockBackend::new();
        let entries = vec![
            entry(0, mock_bytes(60, 40, 6)),
            entry(1, vec![1]),
            entry(2, mock_bytes(60, 40, 1)),
        ];
        let config = LedgerConfiguration {
            customer_name: None,
            date_stamp: DateStampMode::Fixed(today()),
        };
        let reports = survey(&entries, &config, &backend);

        assert_eq!(reports.len(), 3);
        assert_eq!((reports[0].width, reports[0].height), (Some(40), Some(60)));
        assert_eq!(reports[0].orientation, "rotate 90 cw");
        assert_eq!(reports[0].stamp_text.as_deref(), Some("2024.06.01"));
        assert!(reports[1].error.is_some());
        assert_eq!(reports[1].slot, None);
        assert_eq!(
            reports[2].slot,
            Some(GridSlot {
                row: 2,
                column: Column::Right
            })
        );
    }

    #[test]
    fn survey_capture_mode_reports_dates() {
        let date = LedgerDate::from_ymd(2024, 5, 1).unwrap();
        let backend = MockBackend::new().with_capture_date(50, date);
        let config = LedgerConfiguration {
            customer_name: None,
            date_stamp: DateStampMode::FromCapture,
        };
        let reports = survey(&[entry(0, mock_bytes(50, 20, 1))], &config, &backend);
        assert_eq!(reports[0].capture_date.as_deref(), Some("2024.05.01"));
        assert_eq!(reports[0].stamp_text.as_deref(), Some("2024.05.01"));
    }
}
