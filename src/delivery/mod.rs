//! Delivery clients: one message per recipient through SMTP or the Resend API.

pub mod resend;
pub mod smtp;
pub mod templates;

pub use resend::ResendDelivery;
pub use smtp::SmtpDelivery;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::TransportConfig;
use crate::error::{ConfigError, DeliveryError};
use crate::render::Artifact;
use crate::roster::Recipient;

/// Sends a rendered card to one recipient.
///
/// Implementations make exactly one attempt per call and return only once the
/// transport has accepted the message.
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Transport name for logs and status responses.
    fn name(&self) -> &str;

    /// Check connectivity/credentials without sending anything.
    async fn verify(&self) -> Result<(), DeliveryError>;

    async fn deliver(&self, recipient: &Recipient, artifact: &Artifact) -> Result<(), DeliveryError>;
}

/// Build the delivery client for one batch.
///
/// Fails fast when the selected transport has no credentials configured.
pub fn connect(config: &TransportConfig) -> Result<Arc<dyn Delivery>, ConfigError> {
    let delivery: Arc<dyn Delivery> = match config {
        TransportConfig::Smtp(smtp) => Arc::new(SmtpDelivery::from_config(smtp)?),
        TransportConfig::Resend(resend) => Arc::new(ResendDelivery::from_config(resend)?),
    };
    tracing::debug!(transport = delivery.name(), "Delivery client ready");
    Ok(delivery)
}
