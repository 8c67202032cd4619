//! Workbook reader. First worksheet, header row 1, one recipient per data row.

use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Range, Reader, open_workbook_auto, open_workbook_auto_from_rs};
use tracing::{debug, info};

use super::Recipient;
use super::headers::resolve_columns;
use crate::error::ValidationError;

/// Read recipients from a workbook on disk (`.xlsx`, `.xls`, `.ods`).
pub fn read_workbook(path: &Path) -> Result<Vec<Recipient>, ValidationError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| ValidationError::Workbook(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ValidationError::NoWorksheet)?
        .map_err(|e| ValidationError::Workbook(e.to_string()))?;
    parse_rows(&sheet_rows(&range))
}

/// Read recipients from an in-memory workbook.
pub fn read_workbook_bytes(bytes: Vec<u8>) -> Result<Vec<Recipient>, ValidationError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ValidationError::Workbook(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ValidationError::NoWorksheet)?
        .map_err(|e| ValidationError::Workbook(e.to_string()))?;
    parse_rows(&sheet_rows(&range))
}

/// Turn a grid of text cells into recipients. Row 0 is the header row.
///
/// - Rows whose known-header cells are all empty are skipped.
/// - Rows lacking Name or Email are dropped without error.
/// - Zero surviving rows is an error.
pub fn parse_rows(rows: &[Vec<String>]) -> Result<Vec<Recipient>, ValidationError> {
    let headers = rows.first().cloned().unwrap_or_default();
    let columns = resolve_columns(&headers)?;

    let mut recipients = Vec::new();
    for (idx, row) in rows.iter().enumerate().skip(1) {
        let has_data = row
            .iter()
            .enumerate()
            .any(|(col, cell)| is_known_header(&headers, col) && !cell.trim().is_empty());
        if !has_data {
            continue;
        }

        let cell = |col: usize| row.get(col).map(String::as_str).unwrap_or_default();
        match Recipient::new(cell(columns.name), cell(columns.phone), cell(columns.email)) {
            Ok(recipient) => recipients.push(recipient),
            Err(e) => debug!(row = idx + 1, reason = %e, "Dropping incomplete row"),
        }
    }

    if recipients.is_empty() {
        return Err(ValidationError::NoValidRows);
    }

    info!(count = recipients.len(), "Parsed recipients from workbook");
    Ok(recipients)
}

fn is_known_header(headers: &[String], col: usize) -> bool {
    headers.get(col).is_some_and(|h| !h.trim().is_empty())
}

/// Flatten a worksheet range into text rows anchored at A1.
///
/// calamine ranges start at the first used cell, so leading empty rows and
/// columns are re-inserted to keep "row 1" meaning the sheet's first row.
fn sheet_rows(range: &Range<Data>) -> Vec<Vec<String>> {
    let Some((first_row, first_col)) = range.start() else {
        return Vec::new();
    };
    let mut rows = vec![Vec::new(); first_row as usize];
    for row in range.rows() {
        let mut cells = vec![String::new(); first_col as usize];
        cells.extend(row.iter().map(cell_text));
        rows.push(cells);
    }
    rows
}

/// Coerce any cell type to text.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        // Numbers typed into Excel arrive as floats; phone numbers must not
        // grow a fractional part.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}
