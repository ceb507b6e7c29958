//! Native spreadsheet output.

use std::borrow::Cow;
use std::path::Path;

use abstractor_core::{ArticleRecord, COLUMNS};
use rust_xlsxwriter::{Format, Workbook};

use crate::ExportError;

/// Most characters a single XLSX cell can hold.
pub const MAX_CELL_CHARS: usize = 32_767;

pub const SHEET_NAME: &str = "Sheet1";

/// Cut `value` down to [`MAX_CELL_CHARS`] characters.
pub fn fit_cell(value: &str) -> Cow<'_, str> {
    match value.char_indices().nth(MAX_CELL_CHARS) {
        Some((cut, _)) => Cow::Owned(value[..cut].to_string()),
        None => Cow::Borrowed(value),
    }
}

/// Write `records` to an XLSX workbook at `path`, replacing any existing file.
///
/// One bold header row in declared column order, then one row per record. No
/// index column. Zero records produce a header-only sheet.
pub fn write_xlsx(records: &[ArticleRecord], path: &Path) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, column) in COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, column.header(), &header_format)?;
    }

    for (i, record) in records.iter().enumerate() {
        let row = (i + 1) as u32;
        for (col, column) in COLUMNS.iter().enumerate() {
            let value = record.cell(*column);
            if value.is_empty() {
                continue;
            }
            let value = fit_cell(value);
            if let Cow::Owned(_) = value {
                tracing::warn!(
                    identifier = %record.identifier,
                    column = column.header(),
                    "cell exceeds spreadsheet limit, truncated to {MAX_CELL_CHARS} characters"
                );
            }
            sheet.write_string(row, col as u16, value.as_ref())?;
        }
    }

    workbook.save(path)?;
    Ok(())
}
