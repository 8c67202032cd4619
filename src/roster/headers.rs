//! Header row matching.

use crate::error::ValidationError;

/// Logical columns every roster must provide.
pub const REQUIRED_COLUMNS: [&str; 3] = ["Name", "Phone", "Email"];

/// Case-insensitive substring test: does `header` satisfy the logical column?
///
/// "Full Name" satisfies "Name"; "Recipient Email Address" satisfies "Email".
pub fn header_matches(header: &str, logical: &str) -> bool {
    header.to_lowercase().contains(&logical.to_lowercase())
}

/// Column positions bound to each logical column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub name: usize,
    pub phone: usize,
    pub email: usize,
}

/// Bind each required column to a header position.
///
/// An exact (case-insensitive) header wins over a substring match; otherwise
/// the left-most matching header is used. Fails listing every missing column.
pub fn resolve_columns(headers: &[String]) -> Result<ColumnMap, ValidationError> {
    let mut found = [None; REQUIRED_COLUMNS.len()];
    let mut missing = Vec::new();

    for (slot, logical) in found.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = find_column(headers, logical);
        if slot.is_none() {
            missing.push(logical.to_string());
        }
    }

    match found {
        [Some(name), Some(phone), Some(email)] => Ok(ColumnMap { name, phone, email }),
        _ => Err(ValidationError::MissingColumns(missing)),
    }
}

fn find_column(headers: &[String], logical: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(logical))
        .or_else(|| headers.iter().position(|h| header_matches(h, logical)))
}
