//! Bulk Cards — personalized card mailer.
//!
//! Reads a recipient roster from an `.xlsx` workbook, renders one card per
//! recipient and delivers it by SMTP or the Resend HTTP API, reporting a
//! per-recipient outcome for the whole batch.

pub mod batch;
pub mod config;
pub mod delivery;
pub mod error;
pub mod render;
pub mod roster;
pub mod server;
