//! Document assembly.
//!
//! Stage 3 of the ledger pipeline. Writes the laid-out placements into a
//! single-sheet xlsx workbook held entirely in memory. No file-system I/O
//! happens here; the caller decides where the bytes go.
//!
//! ## Sheet Layout
//!
//! - A4 portrait, sheet name `工事写真台帳`
//! - Columns A and B at 45 character units
//! - Row 1: title, bold 14pt
//! - Each placement: bold 11pt caption (left/top, wrapped) on a 30pt row,
//!   photo stretched to 320×240 on the 190pt row below
//!
//! All of the above come from [`SheetConfig`]; the values listed are the
//! stock defaults.

use crate::config::SheetConfig;
use crate::layout::{Placement, rows_used};
use crate::types::{LedgerConfiguration, LedgerDate};
use rust_xlsxwriter::{Format, FormatAlign, Image, Workbook, XlsxError};
use thiserror::Error;

/// Suffix of the title cell.
pub const TITLE_SUFFIX: &str = "施工前写真";

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("Cannot embed photo in {cell}: {source}")]
    Image {
        cell: String,
        #[source]
        source: XlsxError,
    },
}

/// The finished workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    /// Complete xlsx file contents.
    pub bytes: Vec<u8>,
    pub image_count: usize,
    /// Caption/image row pairs filled.
    pub rows_used: usize,
}

/// Title cell text. An empty customer name drops the prefix; any other
/// name is printed as given.
///
/// The separator is a full-width space (U+3000).
pub fn title_text(customer: Option<&str>) -> String {
    match customer.filter(|s| !s.is_empty()) {
        Some(name) => format!("{name}\u{3000}{TITLE_SUFFIX}"),
        None => TITLE_SUFFIX.to_string(),
    }
}

/// Download filename for a ledger built on `date`.
pub fn suggested_filename(date: LedgerDate) -> String {
    format!("工事写真台帳_{}.xlsx", date.date().format("%Y%m%d"))
}

/// Build the workbook for the given placements.
pub fn assemble(
    placements: &[Placement],
    config: &LedgerConfiguration,
    sheet: &SheetConfig,
) -> Result<RenderedArtifact, DocumentError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&sheet.sheet_name)?;
    worksheet.set_paper_size(sheet.paper_size);
    worksheet.set_portrait();
    worksheet.set_column_width(0, sheet.column_width)?;
    worksheet.set_column_width(1, sheet.column_width)?;

    let title_format = Format::new()
        .set_bold()
        .set_font_name(&sheet.font_name)
        .set_font_size(sheet.title_font_size);
    worksheet.write_string_with_format(0, 0, title_text(config.customer()), &title_format)?;

    let caption_format = Format::new()
        .set_bold()
        .set_font_name(&sheet.font_name)
        .set_font_size(sheet.caption_font_size)
        .set_align(FormatAlign::Left)
        .set_align(FormatAlign::Top)
        .set_text_wrap();

    for placement in placements {
        // Grid rows are 1-based; the worksheet API is 0-based.
        let caption_row = placement.slot.caption_row() - 1;
        let image_row = placement.slot.image_row() - 1;
        let col = placement.slot.column.index();

        worksheet.write_string_with_format(caption_row, col, &placement.caption, &caption_format)?;

        let image = Image::new_from_buffer(&placement.image)
            .map_err(|source| DocumentError::Image {
                cell: placement.slot.image_cell(),
                source,
            })?
            .set_scale_to_size(sheet.image_width, sheet.image_height, false);
        worksheet.insert_image(image_row, col, &image)?;

        worksheet.set_row_height(caption_row, sheet.caption_row_height)?;
        worksheet.set_row_height(image_row, sheet.image_row_height)?;
    }

    let bytes = workbook.save_to_buffer()?;
    tracing::debug!(
        images = placements.len(),
        bytes = bytes.len(),
        "assembled workbook"
    );
    Ok(RenderedArtifact {
        bytes,
        image_count: placements.len(),
        rows_used: rows_used(placements.len()),
    })
}
