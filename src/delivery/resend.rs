//! Resend HTTP API delivery.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::info;

use super::Delivery;
use super::templates::{attachment_filename, message_body, resend_subject};
use crate::config::ResendConfig;
use crate::error::{ConfigError, DeliveryError};
use crate::render::Artifact;
use crate::roster::Recipient;

/// Resend API client bound to one batch.
pub struct ResendDelivery {
    client: reqwest::Client,
    api_key: SecretString,
    from: String,
    api_url: String,
}

impl ResendDelivery {
    /// Requires an API key.
    pub fn from_config(config: &ResendConfig) -> Result<Self, ConfigError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| ConfigError::CredentialsMissing {
                hint: "RESEND_API_KEY in the environment".into(),
            })?;
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            from: config.from.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn emails_url(&self) -> String {
        format!("{}/emails", self.api_url)
    }

    fn domains_url(&self) -> String {
        format!("{}/domains", self.api_url)
    }

    /// JSON request body for one recipient.
    pub fn payload(&self, recipient: &Recipient, artifact: &Artifact) -> Result<Value, DeliveryError> {
        let mut body = json!({
            "from": self.from,
            "to": [recipient.email()],
            "subject": resend_subject(recipient),
            "html": message_body(recipient, artifact)?,
        });
        if let Artifact::Image { bytes, .. } = artifact {
            body["attachments"] = json!([{
                "filename": attachment_filename(recipient),
                "content": BASE64.encode(bytes),
            }]);
        }
        Ok(body)
    }
}

/// Pull the API's own error message out of a failure response.
pub fn api_error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string())
        })
}

#[async_trait]
impl Delivery for ResendDelivery {
    fn name(&self) -> &str {
        "resend"
    }

    /// Authenticated read-only call; a rejected key fails here, not mid-batch.
    async fn verify(&self) -> Result<(), DeliveryError> {
        if self.api_key.expose_secret().is_empty() {
            return Err(DeliveryError::Verify("RESEND_API_KEY is empty".into()));
        }
        let resp = self
            .client
            .get(self.domains_url())
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| DeliveryError::Verify(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(DeliveryError::Verify(api_error_message(status, &text)));
        }
        Ok(())
    }

    async fn deliver(&self, recipient: &Recipient, artifact: &Artifact) -> Result<(), DeliveryError> {
        let resp = self
            .client
            .post(self.emails_url())
            .bearer_auth(self.api_key.expose_secret())
            .json(&self.payload(recipient, artifact)?)
            .send()
            .await
            .map_err(|e| DeliveryError::Send(e.to_string()))?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(DeliveryError::Api(api_error_message(status, &text)));
        }

        let id = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| v.get("id").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_default();
        info!(email = %recipient.email(), id = %id, "Email sent successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn delivery() -> ResendDelivery {
        ResendDelivery::from_config(&ResendConfig {
            api_key: Some(SecretString::from("re_test".to_string())),
            from: "Investment Team <onboarding@resend.dev>".into(),
            api_url: "https://api.resend.com/".into(),
        })
        .unwrap()
    }

    fn recipient() -> Recipient {
        Recipient::new("John Doe", "9876543210", "john@example.com").unwrap()
    }

    #[test]
    fn url_has_no_double_slash() {
        assert_eq!(delivery().emails_url(), "https://api.resend.com/emails");
        assert_eq!(delivery().domains_url(), "https://api.resend.com/domains");
    }

    #[tokio::test]
    async fn verify_fails_when_api_is_unreachable() {
        let delivery = ResendDelivery::from_config(&ResendConfig {
            api_key: Some(SecretString::from("re_test".to_string())),
            from: "Investment Team <onboarding@resend.dev>".into(),
            api_url: "http://127.0.0.1:9".into(),
        })
        .unwrap();
        let err = delivery.verify().await.unwrap_err();
        assert!(matches!(err, DeliveryError::Verify(_)));
    }

    #[tokio::test]
    async fn verify_rejects_empty_key() {
        let delivery = ResendDelivery::from_config(&ResendConfig {
            api_key: Some(SecretString::from(String::new())),
            from: "Investment Team <onboarding@resend.dev>".into(),
            api_url: "http://127.0.0.1:9".into(),
        })
        .unwrap();
        let err = delivery.verify().await.unwrap_err();
        assert!(matches!(err, DeliveryError::Verify(msg) if msg == "RESEND_API_KEY is empty"));
    }

    #[test]
    fn markup_payload_has_no_attachments() {
        let body = delivery()
            .payload(&recipient(), &Artifact::Markup("<div>card</div>".into()))
            .unwrap();
        assert_eq!(body["to"], json!(["john@example.com"]));
        assert_eq!(
            body["subject"],
            "John Doe, Your Personalized Investment Card is Ready!"
        );
        assert!(body["html"].as_str().unwrap().contains("<div>card</div>"));
        assert!(body.get("attachments").is_none());
    }

    #[test]
    fn image_payload_attaches_base64_png() {
        let artifact = Artifact::Image {
            path: PathBuf::from("output/x.png"),
            bytes: b"png".to_vec(),
        };
        let body = delivery().payload(&recipient(), &artifact).unwrap();
        assert_eq!(body["attachments"][0]["filename"], "personalized-card-john-doe.png");
        assert_eq!(body["attachments"][0]["content"], "cG5n");
    }

    #[test]
    fn api_error_prefers_message_field() {
        let msg = api_error_message(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"statusCode":422,"message":"Invalid `to` field.","name":"validation_error"}"#,
        );
        assert_eq!(msg, "Invalid `to` field.");
    }

    #[test]
    fn api_error_falls_back_to_status_text() {
        assert_eq!(
            api_error_message(StatusCode::UNAUTHORIZED, "<html>nope</html>"),
            "Unauthorized"
        );
    }
}
