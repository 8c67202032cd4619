//! HTML/CSS investment card, inlined into the email body.

use async_trait::async_trait;
use handlebars::Handlebars;
use serde::Serialize;

use super::{Artifact, CardRenderer};
use crate::error::RenderError;
use crate::roster::Recipient;

const CARD_TEMPLATE: &str = include_str!("../../templates/card.hbs");

const BENEFITS: [&str; 4] = [
    "Diversified Portfolio",
    "Professional Management",
    "Tax Benefits",
    "Flexible Investment",
];

#[derive(Serialize)]
struct CardContext<'a> {
    name: &'a str,
    phone: &'a str,
    email: &'a str,
    benefits: &'a [&'a str],
}

/// Fills a fixed card template with the recipient's details.
#[derive(Debug, Default)]
pub struct HtmlCardRenderer;

impl HtmlCardRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Build the card fragment. Layout is left to markup flow.
    pub fn card_html(recipient: &Recipient) -> Result<String, RenderError> {
        let context = CardContext {
            name: recipient.name(),
            phone: recipient.phone(),
            email: recipient.email(),
            benefits: &BENEFITS,
        };
        Handlebars::new()
            .render_template(CARD_TEMPLATE, &context)
            .map_err(|e| RenderError::Template(e.to_string()))
    }
}

#[async_trait]
impl CardRenderer for HtmlCardRenderer {
    fn name(&self) -> &str {
        "markup"
    }

    async fn render(&self, recipient: &Recipient) -> Result<Artifact, RenderError> {
        Self::card_html(recipient).map(Artifact::Markup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_contains_escaped_recipient_fields() {
        let r = Recipient::new("O'Brien <Admin>", "555-0100", "obrien@example.com").unwrap();
        let html = HtmlCardRenderer::card_html(&r).unwrap();
        assert!(html.contains("O&#x27;Brien &lt;Admin&gt;"));
        assert!(html.contains("555-0100"));
        assert!(html.contains("obrien@example.com"));
        assert!(!html.contains("<Admin>"));
    }

    #[test]
    fn card_escapes_quotes_and_ampersands() {
        let r = Recipient::new(r#"Tom "T" & Co"#, "", "tom@example.com").unwrap();
        let html = HtmlCardRenderer::card_html(&r).unwrap();
        assert!(html.contains("Tom &quot;T&quot; &amp; Co"));
    }

    #[test]
    fn card_lists_every_benefit() {
        let r = Recipient::new("Jane", "", "jane@example.com").unwrap();
        let html = HtmlCardRenderer::card_html(&r).unwrap();
        for benefit in BENEFITS {
            assert!(html.contains(&format!("<span>{benefit}</span>")), "{benefit}");
        }
        assert_eq!(html.matches("&#10003;").count(), BENEFITS.len());
        assert!(html.contains("SYSTEMATIC INVESTMENT PLAN"));
    }

    #[tokio::test]
    async fn render_returns_markup_artifact() {
        let r = Recipient::new("Jane Smith", "9876543211", "jane@example.com").unwrap();
        let artifact = HtmlCardRenderer::new().render(&r).await.unwrap();
        match artifact {
            Artifact::Markup(html) => assert!(html.contains("Jane Smith")),
            other => panic!("expected markup, got {other:?}"),
        }
    }
}
