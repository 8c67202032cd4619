//! Card rendering — one personalized artifact per recipient.
//!
//! Two renderers share the [`CardRenderer`] contract:
//! - [`ImageCardRenderer`]: draws a label box onto the template PNG/JPEG.
//! - [`HtmlCardRenderer`]: fills a fixed HTML/CSS card with the recipient's details.

pub mod markup;
pub mod overlay;

pub use overlay::{CardLayout, ImageCardRenderer, compute_layout};
pub use markup::HtmlCardRenderer;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{CardConfig, PathsConfig, RendererKind};
use crate::error::RenderError;
use crate::roster::Recipient;

/// A rendered card, owned by the orchestrator for one record.
#[derive(Debug, Clone)]
pub enum Artifact {
    /// Encoded PNG, also written to `path`. The caller deletes the file.
    Image { path: PathBuf, bytes: Vec<u8> },
    /// HTML fragment, kept in memory only.
    Markup(String),
}

impl Artifact {
    /// Temporary file backing this artifact, if any.
    pub fn backing_file(&self) -> Option<&Path> {
        match self {
            Self::Image { path, .. } => Some(path),
            Self::Markup(_) => None,
        }
    }
}

/// Produces one artifact per recipient.
#[async_trait]
pub trait CardRenderer: Send + Sync {
    /// Short renderer name for logs.
    fn name(&self) -> &str;

    async fn render(&self, recipient: &Recipient) -> Result<Artifact, RenderError>;
}

/// Label overlaid on the card: `name | identifier | phone`, empty parts omitted.
pub fn card_label(recipient: &Recipient, identifier: Option<&str>) -> String {
    [
        recipient.name(),
        identifier.map(str::trim).unwrap_or_default(),
        recipient.phone(),
    ]
    .into_iter()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(" | ")
}

/// Build the renderer selected by configuration.
pub fn build_renderer(card: &CardConfig, paths: &PathsConfig) -> Arc<dyn CardRenderer> {
    match card.renderer {
        RendererKind::Image => Arc::new(ImageCardRenderer::new(
            paths.template_path(),
            card.font_path.clone(),
            paths.output_dir.clone(),
            card.identifier.clone(),
        )),
        RendererKind::Markup => Arc::new(HtmlCardRenderer::new()),
    }
}
