//! CLI output formatting for the ledger commands.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Every photo is shown
//! by its position and caption first; source paths, stamp text and errors
//! follow as indented context lines. This makes the output read like the
//! ledger itself while still letting users trace entries back to files.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! 山田 太郎　施工前写真 (3 photos, stamp 2024.06.01)
//!     001 ① トイレ手すり取り付け → A2
//!         Stamp: 2024.06.01
//!     002 ② 浴室 → skipped
//!         Reason: Failed to decode image: ...
//!     003 ③ 玄関 → B2
//!         Stamp: 2024.06.01
//! Assembled 2 photos on 1 row (48.2 KB)
//! Ledger → out/工事写真台帳_20240601.xlsx
//! ```
//!
//! ## Check
//!
//! ```text
//! 施工前写真 (2 photos, stamp from capture date)
//!     001 ① トイレ → A2
//!         Source: photos/001-toilet.jpg
//!         Orientation: rotate 90 cw
//!         Captured: 2024.05.01
//!         Stamp: 2024.05.01
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::ledger::{EntryReport, LedgerBuild, LedgerEvent};
use crate::types::DateStampMode;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format an entry line: position, caption, and where it went.
///
/// ```text
/// 001 ① トイレ → A2
/// 002 ② 浴室 → skipped
/// ```
fn entry_line(index: usize, caption: &str, target: &str) -> String {
    format!("{} {} \u{2192} {}", format_index(index + 1), caption.trim(), target)
}

/// Format a ledger header: title, photo count, and stamp mode.
fn ledger_header(title: &str, count: usize, date_stamp: &DateStampMode) -> String {
    format!(
        "{} ({} {}, {})",
        title,
        count,
        plural(count, "photo"),
        describe_date_stamp(date_stamp)
    )
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

/// Short description of a date stamp mode.
pub fn describe_date_stamp(mode: &DateStampMode) -> String {
    match mode {
        DateStampMode::Fixed(date) => format!("stamp {date}"),
        DateStampMode::FromCapture => "stamp from capture date".to_string(),
        DateStampMode::None => "no stamp".to_string(),
    }
}

/// Human-readable byte count.
fn format_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

// ============================================================================
// Build output
// ============================================================================

/// Format a single build progress event as display lines.
pub fn format_ledger_event(event: &LedgerEvent) -> Vec<String> {
    match event {
        LedgerEvent::Started {
            entry_count,
            title,
            date_stamp,
        } => vec![ledger_header(title, *entry_count, date_stamp)],
        LedgerEvent::EntryRendered {
            index,
            slot,
            caption,
            stamp_text,
            ..
        } => {
            let mut lines = vec![format!(
                "{}{}",
                indent(1),
                entry_line(*index, caption, &slot.caption_cell())
            )];
            if let Some(text) = stamp_text {
                lines.push(format!("{}Stamp: {}", indent(2), text));
            }
            lines
        }
        LedgerEvent::EntrySkipped {
            index,
            caption,
            reason,
        } => vec![
            format!("{}{}", indent(1), entry_line(*index, caption, "skipped")),
            format!("{}Reason: {}", indent(2), reason),
        ],
        LedgerEvent::Assembled {
            image_count,
            rows_used,
            bytes,
            ..
        } => vec![format!(
            "Assembled {} {} on {} {} ({})",
            image_count,
            plural(*image_count, "photo"),
            rows_used,
            plural(*rows_used, "row"),
            format_size(*bytes)
        )],
    }
}

/// Format the closing lines of a build: where the ledger went and what was left out.
pub fn format_build_summary(build: &LedgerBuild, written_to: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    if !build.failures.is_empty() {
        lines.push(format!(
            "Skipped {} {}:",
            build.failures.len(),
            plural(build.failures.len(), "photo")
        ));
        for failure in &build.failures {
            lines.push(format!("{}{}", indent(1), failure));
        }
    }
    lines.push(format!("Ledger \u{2192} {}", written_to.display()));
    lines
}

pub fn print_build_summary(build: &LedgerBuild, written_to: &Path) {
    for line in format_build_summary(build, written_to) {
        println!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format the dry-run report for `check`.
///
/// `sources` runs parallel to `reports`; paths are shown relative to `base`
/// when possible.
pub fn format_check_output(
    title: &str,
    date_stamp: &DateStampMode,
    reports: &[EntryReport],
    sources: &[std::path::PathBuf],
    base: &Path,
) -> Vec<String> {
    let mut lines = vec![ledger_header(title, reports.len(), date_stamp)];
    for (report, source) in reports.iter().zip(sources) {
        let target = match report.slot {
            Some(slot) => slot.caption_cell(),
            None => "skipped".to_string(),
        };
        lines.push(format!(
            "{}{}",
            indent(1),
            entry_line(report.index, &report.caption, &target)
        ));
        let shown = source.strip_prefix(base).unwrap_or(source);
        lines.push(format!("{}Source: {}", indent(2), shown.display()));
        lines.push(format!("{}Orientation: {}", indent(2), report.orientation));
        if let Some(date) = &report.capture_date {
            lines.push(format!("{}Captured: {}", indent(2), date));
        }
        if let Some(text) = &report.stamp_text {
            lines.push(format!("{}Stamp: {}", indent(2), text));
        }
        if let Some(err) = &report.error {
            lines.push(format!("{}Error: {}", indent(2), err));
        }
    }
    let skipped = reports.iter().filter(|r| r.slot.is_none()).count();
    let kept = reports.len() - skipped;
    let mut summary = format!(
        "{} {} on {} {}",
        kept,
        plural(kept, "photo"),
        crate::layout::rows_used(kept),
        plural(crate::layout::rows_used(kept), "row")
    );
    if skipped > 0 {
        summary.push_str(&format!(", {} unreadable", skipped));
    }
    lines.push(summary);
    lines
}

pub fn print_check_output(
    title: &str,
    date_stamp: &DateStampMode,
    reports: &[EntryReport],
    sources: &[std::path::PathBuf],
    base: &Path,
) {
    for line in format_check_output(title, date_stamp, reports, sources, base) {
        println!("{}", line);
    }
}

// ============================================================================
// Preview output
// ============================================================================

/// Format one preview line: position, caption, and the written file.
pub fn format_preview_line(index: usize, caption: &str, written_to: &Path) -> String {
    format!(
        "{}{}",
        indent(1),
        entry_line(index, caption, &written_to.display().to_string())
    )
}
