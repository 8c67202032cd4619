//! Recipient roster — validated records read from a spreadsheet or a JSON batch.

pub mod headers;
pub mod reader;

pub use headers::{REQUIRED_COLUMNS, header_matches};
pub use reader::{parse_rows, read_workbook, read_workbook_bytes};

use serde::Serialize;
use serde_json::Value;

use crate::error::ValidationError;

/// One validated {name, phone, email} entry.
///
/// Serializes with the capitalized keys the upload preview returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Phone")]
    phone: String,
    #[serde(rename = "Email")]
    email: String,
}

impl Recipient {
    /// Build a recipient, trimming every field.
    ///
    /// Name and email must be non-empty after trimming; phone may be empty.
    pub fn new(
        name: impl AsRef<str>,
        phone: impl AsRef<str>,
        email: impl AsRef<str>,
    ) -> Result<Self, ValidationError> {
        let name = name.as_ref().trim();
        let email = email.as_ref().trim();
        if name.is_empty() {
            return Err(ValidationError::MissingField("Name"));
        }
        if email.is_empty() {
            return Err(ValidationError::MissingField("Email"));
        }
        Ok(Self {
            name: name.to_string(),
            phone: phone.as_ref().trim().to_string(),
            email: email.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Lower-case, dash-separated name for attachment file names.
    pub fn slug(&self) -> String {
        self.name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
            .to_lowercase()
    }
}

/// One not-yet-validated record from a batch request body.
///
/// Values may be any JSON scalar; they are coerced to text the same way
/// spreadsheet cells are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordInput {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl RecordInput {
    /// Read `Name`/`Phone`/`Email` (or their lower-case forms) from a JSON value.
    /// Non-object values yield an empty record.
    pub fn from_json(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        let field = |key: &str| {
            obj.get(key)
                .or_else(|| obj.get(&key.to_lowercase()))
                .and_then(json_text)
        };
        Self {
            name: field("Name"),
            phone: field("Phone"),
            email: field("Email"),
        }
    }

    /// Identifier used in the delivery result, even for invalid records.
    pub fn email_hint(&self) -> String {
        self.email.as_deref().map(str::trim).unwrap_or_default().to_string()
    }

    pub fn to_recipient(&self) -> Result<Recipient, ValidationError> {
        Recipient::new(
            self.name.as_deref().unwrap_or_default(),
            self.phone.as_deref().unwrap_or_default(),
            self.email.as_deref().unwrap_or_default(),
        )
    }
}

impl From<&Recipient> for RecordInput {
    fn from(r: &Recipient) -> Self {
        Self {
            name: Some(r.name.clone()),
            phone: Some(r.phone.clone()),
            email: Some(r.email.clone()),
        }
    }
}

fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn recipient_trims_fields() {
        let r = Recipient::new("  Ada Lovelace ", " 555-0100 ", " ada@example.com\t").unwrap();
        assert_eq!(r.name(), "Ada Lovelace");
        assert_eq!(r.phone(), "555-0100");
        assert_eq!(r.email(), "ada@example.com");
    }

    #[test]
    fn recipient_requires_name_and_email() {
        assert!(matches!(
            Recipient::new("  ", "1", "a@b.c"),
            Err(ValidationError::MissingField("Name"))
        ));
        assert!(matches!(
            Recipient::new("Ada", "1", ""),
            Err(ValidationError::MissingField("Email"))
        ));
    }

    #[test]
    fn recipient_serializes_with_capitalized_keys() {
        let r = Recipient::new("Ada", "", "ada@example.com").unwrap();
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json, json!({"Name": "Ada", "Phone": "", "Email": "ada@example.com"}));
    }

    #[test]
    fn slug_collapses_whitespace() {
        let r = Recipient::new("Mary  Jane Watson", "", "mj@example.com").unwrap();
        assert_eq!(r.slug(), "mary-jane-watson");
    }

    #[test]
    fn record_input_coerces_scalars() {
        let input = RecordInput::from_json(&json!({
            "Name": "Bob",
            "Phone": 9876543210u64,
            "Email": "bob@example.com"
        }));
        assert_eq!(input.phone.as_deref(), Some("9876543210"));
        assert_eq!(input.to_recipient().unwrap().phone(), "9876543210");
    }

    #[test]
    fn record_input_accepts_lowercase_keys() {
        let input = RecordInput::from_json(&json!({"name": "Jane", "email": "jane@example.com"}));
        let r = input.to_recipient().unwrap();
        assert_eq!(r.name(), "Jane");
        assert_eq!(r.phone(), "");
    }

    #[test]
    fn record_input_from_non_object_is_invalid() {
        let input = RecordInput::from_json(&json!("just a string"));
        assert_eq!(input, RecordInput::default());
        assert!(input.to_recipient().is_err());
        assert_eq!(input.email_hint(), "");
    }
}
