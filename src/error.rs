//! Error types for Bulk Cards.

use std::path::PathBuf;

/// Top-level error type.
///
/// Only request-level failures travel as this type. Record-level failures are
/// captured as [`RecordError`] and folded into the batch report.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Malformed or incomplete input. The batch never starts.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("No valid data rows found in the Excel file")]
    NoValidRows,

    #[error("No worksheet found in the Excel file")]
    NoWorksheet,

    #[error("Failed to read workbook: {0}")]
    Workbook(String),

    #[error("Invalid data format")]
    InvalidFormat,

    #[error("Record is missing required field: {0}")]
    MissingField(&'static str),

    #[error("{0}")]
    Upload(String),
}

/// Transport or environment configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Email credentials not configured. Please set {hint}")]
    CredentialsMissing { hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to build transport: {0}")]
    Transport(String),
}

/// Required on-disk asset missing or unusable.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Template not found at {}", .0.display())]
    TemplateMissing(PathBuf),

    #[error("Template at {} could not be decoded: {reason}", .path.display())]
    TemplateCorrupt { path: PathBuf, reason: String },

    #[error("Font not found at {}", .0.display())]
    FontMissing(PathBuf),

    #[error("Font at {} is not a valid TrueType/OpenType font", .0.display())]
    FontInvalid(PathBuf),
}

/// Drawing or encoding failure for one record.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Failed to write rendered card: {0}")]
    Io(#[from] std::io::Error),

    #[error("Render task failed: {0}")]
    Task(String),

    #[error("Failed to render card template: {0}")]
    Template(String),
}

/// Transport rejected or failed to send one message.
///
/// The display text keeps the transport's own cause so operators can
/// diagnose auth, address and network problems from the batch report.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Failed to send email: {0}")]
    Send(String),

    #[error("Failed to send email: invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to send email: could not build message: {0}")]
    Build(String),

    #[error("Failed to send email: Resend API error: {0}")]
    Api(String),

    #[error("Transport verification failed: {0}")]
    Verify(String),
}

/// Anything that can fail a single record inside a batch.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
