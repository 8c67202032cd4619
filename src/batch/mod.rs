//! Batch orchestration — render, send and clean up one record at a time.
//!
//! Per record: `pending → rendering → sending → cleanup → recorded`. There is no
//! retry; any failure becomes that record's error result and the loop moves on.

pub mod progress;

pub use progress::{ProgressEvent, ProgressHub};

use std::io::ErrorKind;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::delivery::Delivery;
use crate::error::RecordError;
use crate::render::{Artifact, CardRenderer};
use crate::roster::{Recipient, RecordInput};

/// Message on every successful record.
pub const SUCCESS_MESSAGE: &str = "Email sent successfully";

/// Message on every completed report.
pub const REPORT_MESSAGE: &str = "Bulk email process completed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Success,
    Error,
}

/// Outcome for one input record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryResult {
    pub email: String,
    pub status: RecordStatus,
    pub message: String,
}

impl DeliveryResult {
    pub fn success(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            status: RecordStatus::Success,
            message: SUCCESS_MESSAGE.to_string(),
        }
    }

    pub fn error(email: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            status: RecordStatus::Error,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RecordStatus::Success
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub success: usize,
    pub errors: usize,
}

/// Aggregate for a finished batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub message: String,
    pub results: Vec<DeliveryResult>,
    pub summary: BatchSummary,
}

impl BatchReport {
    pub fn from_results(results: Vec<DeliveryResult>) -> Self {
        let success = results.iter().filter(|r| r.is_success()).count();
        let summary = BatchSummary {
            total: results.len(),
            success,
            errors: results.len() - success,
        };
        Self {
            message: REPORT_MESSAGE.to_string(),
            results,
            summary,
        }
    }
}

/// Drives renderer and delivery client over a batch of records.
pub struct BatchOrchestrator {
    renderer: Arc<dyn CardRenderer>,
    delivery: Arc<dyn Delivery>,
    progress: Option<Arc<ProgressHub>>,
}

impl BatchOrchestrator {
    pub fn new(renderer: Arc<dyn CardRenderer>, delivery: Arc<dyn Delivery>) -> Self {
        Self {
            renderer,
            delivery,
            progress: None,
        }
    }

    /// Publish progress events to `hub` while running.
    pub fn with_progress(mut self, hub: Arc<ProgressHub>) -> Self {
        self.progress = Some(hub);
        self
    }

    /// Process every record in order and aggregate the report.
    pub async fn run(&self, records: &[RecordInput]) -> BatchReport {
        let batch_id = Uuid::new_v4();
        let total = records.len();
        info!(
            batch_id = %batch_id,
            total,
            renderer = self.renderer.name(),
            transport = self.delivery.name(),
            "Starting bulk email batch"
        );
        self.publish(ProgressEvent::BatchStarted { batch_id, total });

        let mut results = Vec::with_capacity(total);
        for (idx, record) in records.iter().enumerate() {
            results.push(self.process_one_record(record).await);

            let processed = idx + 1;
            info!(batch_id = %batch_id, "Processed {processed}/{total} emails");
            self.publish(ProgressEvent::RecordProcessed {
                batch_id,
                processed,
                total,
            });
        }

        let report = BatchReport::from_results(results);
        info!(
            batch_id = %batch_id,
            success = report.summary.success,
            errors = report.summary.errors,
            "Batch complete"
        );
        self.publish(ProgressEvent::BatchCompleted {
            batch_id,
            summary: report.summary,
        });
        report
    }

    /// Convenience entry for already-validated recipients.
    pub async fn run_recipients(&self, recipients: &[Recipient]) -> BatchReport {
        let records: Vec<RecordInput> = recipients.iter().map(RecordInput::from).collect();
        self.run(&records).await
    }

    /// The per-record boundary: never fails, always yields a result.
    pub async fn process_one_record(&self, record: &RecordInput) -> DeliveryResult {
        let email = record.email_hint();
        let outcome = match record.to_recipient() {
            Ok(recipient) => self.render_and_send(&recipient).await,
            Err(e) => Err(RecordError::from(e)),
        };

        match outcome {
            Ok(()) => DeliveryResult::success(email),
            Err(e) => {
                error!(email = %email, error = %e, "Error processing record");
                DeliveryResult::error(email, e.to_string())
            }
        }
    }

    async fn render_and_send(&self, recipient: &Recipient) -> Result<(), RecordError> {
        let artifact = self.renderer.render(recipient).await?;
        let sent = self.delivery.deliver(recipient, &artifact).await;
        cleanup_artifact(&artifact).await;
        sent?;
        Ok(())
    }

    fn publish(&self, event: ProgressEvent) {
        if let Some(hub) = &self.progress {
            hub.publish(event);
        }
    }
}

/// Best-effort removal of an artifact's backing file. Failures are logged only.
pub async fn cleanup_artifact(artifact: &Artifact) {
    let Some(path) = artifact.backing_file() else {
        return;
    };
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed rendered card"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Could not remove rendered card"),
    }
}
