//! Subject lines and HTML bodies shared by the delivery clients.

use handlebars::Handlebars;
use serde::Serialize;

use crate::error::DeliveryError;
use crate::render::Artifact;
use crate::roster::Recipient;

const BODY_TEMPLATE: &str = include_str!("../../templates/email_body.hbs");

/// Content-ID of the inline card image.
pub const CARD_CONTENT_ID: &str = "personalizedCard";

/// Subject used for SMTP delivery.
pub fn smtp_subject(recipient: &Recipient) -> String {
    format!("Personalized Card for {}", recipient.name())
}

/// Subject used for Resend delivery.
pub fn resend_subject(recipient: &Recipient) -> String {
    format!("{}, Your Personalized Investment Card is Ready!", recipient.name())
}

/// `personalized-card-<name-slug>.png`
pub fn attachment_filename(recipient: &Recipient) -> String {
    format!("personalized-card-{}.png", recipient.slug())
}

#[derive(Serialize)]
struct BodyContext<'a> {
    name: &'a str,
    phone: &'a str,
    email: &'a str,
    content_id: &'a str,
    /// Inlined verbatim; the card renderer has already escaped its fields.
    card_html: Option<&'a str>,
}

/// HTML body for one recipient.
///
/// Image artifacts are referenced through `cid:` (SMTP inline part) and also
/// attached; markup artifacts are inlined.
pub fn message_body(recipient: &Recipient, artifact: &Artifact) -> Result<String, DeliveryError> {
    let context = BodyContext {
        name: recipient.name(),
        phone: recipient.phone(),
        email: recipient.email(),
        content_id: CARD_CONTENT_ID,
        card_html: match artifact {
            Artifact::Image { .. } => None,
            Artifact::Markup(html) => Some(html.as_str()),
        },
    };
    Handlebars::new()
        .render_template(BODY_TEMPLATE, &context)
        .map_err(|e| DeliveryError::Build(e.to_string()))
}
