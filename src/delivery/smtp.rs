//! SMTP delivery via lettre's async transport.
//!
//! Image cards go out as `multipart/mixed`: a `multipart/related` HTML body
//! that shows the card inline through its Content-ID, plus the same PNG as a
//! regular attachment.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use tracing::info;

use super::Delivery;
use super::templates::{CARD_CONTENT_ID, attachment_filename, message_body, smtp_subject};
use crate::config::{SmtpConfig, SmtpTls};
use crate::error::{ConfigError, DeliveryError};
use crate::render::Artifact;
use crate::roster::Recipient;

/// SMTP account bound to one batch.
pub struct SmtpDelivery {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpDelivery {
    /// Build the transport. Requires both account and secret.
    pub fn from_config(config: &SmtpConfig) -> Result<Self, ConfigError> {
        let (Some(username), Some(password)) = (&config.username, &config.password) else {
            return Err(ConfigError::CredentialsMissing {
                hint: "EMAIL and APP_PASSWORD in .env file".into(),
            });
        };

        let from_raw = config.from.as_deref().unwrap_or(username);
        let from: Mailbox = from_raw.parse().map_err(|e| ConfigError::InvalidValue {
            key: "EMAIL_FROM".into(),
            message: format!("{from_raw}: {e}"),
        })?;

        let builder = match config.tls {
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| ConfigError::Transport(e.to_string()))?,
            SmtpTls::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| ConfigError::Transport(e.to_string()))?,
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
        };

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(
                username.clone(),
                password.expose_secret().to_string(),
            ))
            .build();

        Ok(Self { transport, from })
    }

    /// Assemble the message for one recipient.
    pub fn build_message(
        &self,
        recipient: &Recipient,
        artifact: &Artifact,
    ) -> Result<Message, DeliveryError> {
        let to: Mailbox = recipient
            .email()
            .parse()
            .map_err(|e: lettre::address::AddressError| DeliveryError::InvalidAddress {
                address: recipient.email().to_string(),
                reason: e.to_string(),
            })?;

        let builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(smtp_subject(recipient));
        let html = message_body(recipient, artifact)?;

        let message = match artifact {
            Artifact::Image { bytes, .. } => {
                let png = ContentType::parse("image/png")
                    .map_err(|e| DeliveryError::Build(e.to_string()))?;
                let body = MultiPart::related()
                    .singlepart(SinglePart::html(html))
                    .singlepart(
                        Attachment::new_inline(CARD_CONTENT_ID.to_string())
                            .body(bytes.clone(), png.clone()),
                    );
                builder.multipart(
                    MultiPart::mixed().multipart(body).singlepart(
                        Attachment::new(attachment_filename(recipient)).body(bytes.clone(), png),
                    ),
                )
            }
            Artifact::Markup(_) => builder.singlepart(SinglePart::html(html)),
        };

        message.map_err(|e| DeliveryError::Build(e.to_string()))
    }
}

#[async_trait]
impl Delivery for SmtpDelivery {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn verify(&self) -> Result<(), DeliveryError> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(DeliveryError::Verify("SMTP server refused the connection".into())),
            Err(e) => Err(DeliveryError::Verify(e.to_string())),
        }
    }

    async fn deliver(&self, recipient: &Recipient, artifact: &Artifact) -> Result<(), DeliveryError> {
        let message = self.build_message(recipient, artifact)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| DeliveryError::Send(e.to_string()))?;
        info!(email = %recipient.email(), "Email sent successfully");
        Ok(())
    }
}
