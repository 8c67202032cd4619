//! Roster reader against real .xlsx files authored with rust_xlsxwriter.

use bulk_cards::error::ValidationError;
use bulk_cards::roster::{read_workbook, read_workbook_bytes};
use rust_xlsxwriter::Workbook;

#[test]
fn numeric_phone_cells_keep_all_digits() {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Name").unwrap();
    sheet.write_string(0, 1, "Phone").unwrap();
    sheet.write_string(0, 2, "Email").unwrap();
    sheet.write_string(1, 0, "John Doe").unwrap();
    sheet.write_number(1, 1, 9876543210.0).unwrap();
    sheet.write_string(1, 2, "john@example.com").unwrap();

    let recipients = read_workbook_bytes(workbook.save_to_buffer().unwrap()).unwrap();
    assert_eq!(recipients.len(), 1);
    assert_eq!(recipients[0].phone(), "9876543210");
}

#[test]
fn table_starting_in_column_b_still_resolves() {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, header) in ["Customer Name", "Contact Phone", "Email ID"].iter().enumerate() {
        sheet.write_string(0, col as u16 + 1, *header).unwrap();
    }
    sheet.write_string(1, 1, "Jane Smith").unwrap();
    sheet.write_string(1, 3, "jane@example.com").unwrap();

    let recipients = read_workbook_bytes(workbook.save_to_buffer().unwrap()).unwrap();
    assert_eq!(recipients[0].name(), "Jane Smith");
    assert_eq!(recipients[0].phone(), "");
    assert_eq!(recipients[0].email(), "jane@example.com");
}

#[test]
fn only_first_worksheet_is_read() {
    let mut workbook = Workbook::new();
    let first = workbook.add_worksheet();
    first.write_string(0, 0, "Name").unwrap();
    first.write_string(0, 1, "Phone").unwrap();
    first.write_string(0, 2, "Email").unwrap();
    first.write_string(1, 0, "First").unwrap();
    first.write_string(1, 2, "first@example.com").unwrap();
    let second = workbook.add_worksheet();
    second.write_string(0, 0, "Name").unwrap();
    second.write_string(1, 0, "Ignored").unwrap();

    let recipients = read_workbook_bytes(workbook.save_to_buffer().unwrap()).unwrap();
    assert_eq!(recipients.len(), 1);
    assert_eq!(recipients[0].name(), "First");
}

#[test]
fn reads_workbook_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roster.xlsx");

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Name").unwrap();
    sheet.write_string(0, 1, "Phone").unwrap();
    sheet.write_string(0, 2, "Email").unwrap();
    sheet.write_string(1, 0, "O'Brien").unwrap();
    sheet.write_string(1, 1, "555-0100").unwrap();
    sheet.write_string(1, 2, " obrien@example.com ").unwrap();
    workbook.save(&path).unwrap();

    let recipients = read_workbook(&path).unwrap();
    assert_eq!(recipients[0].name(), "O'Brien");
    assert_eq!(recipients[0].email(), "obrien@example.com");
}

#[test]
fn missing_phone_column_is_named() {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Name").unwrap();
    sheet.write_string(0, 1, "Email").unwrap();
    sheet.write_string(1, 0, "A").unwrap();
    sheet.write_string(1, 1, "a@example.com").unwrap();

    let err = read_workbook_bytes(workbook.save_to_buffer().unwrap()).unwrap_err();
    assert_eq!(err.to_string(), "Missing required columns: Phone");
}

#[test]
fn garbage_bytes_are_a_workbook_error() {
    let err = read_workbook_bytes(b"not a spreadsheet".to_vec()).unwrap_err();
    assert!(matches!(err, ValidationError::Workbook(_)));
}

#[test]
fn missing_file_is_a_workbook_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_workbook(&dir.path().join("absent.xlsx")).unwrap_err();
    assert!(matches!(err, ValidationError::Workbook(_)));
}
