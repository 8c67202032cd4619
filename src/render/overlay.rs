//! Text-overlay renderer — draws the recipient label in a white box near the
//! bottom of the template image and writes the result as a PNG.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use ab_glyph::{FontArc, PxScale};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{Artifact, CardRenderer, card_label};
use crate::error::{AssetError, RenderError};
use crate::roster::Recipient;

/// Bold label size in pixels.
pub const FONT_SIZE: f32 = 65.0;
/// Horizontal padding added to the measured text width (split evenly).
pub const PADDING_X: u32 = 40;
/// Vertical padding added to the font size.
pub const PADDING_Y: u32 = 20;
/// Gap between the bottom of the label box and the bottom of the canvas.
pub const BOTTOM_OFFSET: u32 = 90;

/// DejaVu Sans Bold, used when no font path is configured.
pub const BUNDLED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

const BOX_FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);
const TEXT_FILL: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Where the label box and text go on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardLayout {
    pub box_x: i32,
    pub box_y: i32,
    pub box_width: u32,
    pub box_height: u32,
    /// Top-left of the drawn text.
    pub text_x: i32,
    pub text_y: i32,
}

/// Place the label box: horizontally centered, anchored `BOTTOM_OFFSET` above
/// the bottom edge, text inset by half the horizontal padding and vertically
/// centered. The box is clamped to the canvas origin when it would overflow.
pub fn compute_layout(canvas_width: u32, canvas_height: u32, text_width: u32, text_height: u32) -> CardLayout {
    let box_width = text_width + PADDING_X;
    let box_height = FONT_SIZE as u32 + PADDING_Y;

    let box_x = ((i64::from(canvas_width) - i64::from(box_width)) / 2).max(0) as i32;
    let box_y = (i64::from(canvas_height) - i64::from(box_height) - i64::from(BOTTOM_OFFSET)).max(0) as i32;

    let text_x = box_x + (PADDING_X / 2) as i32;
    let text_y = box_y + ((i64::from(box_height) - i64::from(text_height)) / 2) as i32;

    CardLayout {
        box_x,
        box_y,
        box_width,
        box_height,
        text_x,
        text_y,
    }
}

/// Renders the label onto a template image file.
pub struct ImageCardRenderer {
    template_path: PathBuf,
    font_path: Option<PathBuf>,
    output_dir: PathBuf,
    identifier: Option<String>,
}

impl ImageCardRenderer {
    /// `font_path: None` draws with [`BUNDLED_FONT`].
    pub fn new(
        template_path: PathBuf,
        font_path: Option<PathBuf>,
        output_dir: PathBuf,
        identifier: Option<String>,
    ) -> Self {
        Self {
            template_path,
            font_path,
            output_dir,
            identifier,
        }
    }
}

#[async_trait]
impl CardRenderer for ImageCardRenderer {
    fn name(&self) -> &str {
        "image"
    }

    async fn render(&self, recipient: &Recipient) -> Result<Artifact, RenderError> {
        let label = card_label(recipient, self.identifier.as_deref());
        let template_path = self.template_path.clone();
        let font_path = self.font_path.clone();

        let bytes = tokio::task::spawn_blocking(move || {
            draw_card(&template_path, font_path.as_deref(), &label)
        })
        .await
        .map_err(|e| RenderError::Task(e.to_string()))??;

        fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(unique_file_name());

        // Single write of the fully encoded image; never leave a torn file.
        if let Err(e) = fs::write(&path, &bytes).await {
            if let Err(cleanup) = fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %cleanup, "Could not remove partial card");
            }
            return Err(e.into());
        }

        debug!(path = %path.display(), size = bytes.len(), "Card rendered");
        Ok(Artifact::Image { path, bytes })
    }
}

/// `personalized_<unix-millis>_<uuid>.png`
pub fn unique_file_name() -> String {
    format!(
        "personalized_{}_{}.png",
        chrono::Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    )
}

/// Compose the card in memory and return the encoded PNG (blocking).
pub fn draw_card(
    template_path: &Path,
    font_path: Option<&Path>,
    label: &str,
) -> Result<Vec<u8>, RenderError> {
    let mut canvas = load_template(template_path)?.to_rgba8();
    let font = load_font(font_path)?;

    let scale = PxScale::from(FONT_SIZE);
    let (text_width, text_height) = text_size(scale, &font, label);
    let layout = compute_layout(canvas.width(), canvas.height(), text_width, text_height);

    draw_filled_rect_mut(
        &mut canvas,
        Rect::at(layout.box_x, layout.box_y).of_size(layout.box_width, layout.box_height),
        BOX_FILL,
    );
    draw_text_mut(
        &mut canvas,
        TEXT_FILL,
        layout.text_x,
        layout.text_y,
        scale,
        &font,
        label,
    );

    encode_png(canvas)
}

fn load_template(path: &Path) -> Result<DynamicImage, AssetError> {
    let bytes = std::fs::read(path).map_err(|_| AssetError::TemplateMissing(path.to_path_buf()))?;
    image::load_from_memory(&bytes).map_err(|e| AssetError::TemplateCorrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn load_font(path: Option<&Path>) -> Result<FontArc, AssetError> {
    let Some(path) = path else {
        return FontArc::try_from_slice(BUNDLED_FONT)
            .map_err(|_| AssetError::FontInvalid(PathBuf::from("<bundled>")));
    };
    let bytes = std::fs::read(path).map_err(|_| AssetError::FontMissing(path.to_path_buf()))?;
    FontArc::try_from_vec(bytes).map_err(|_| AssetError::FontInvalid(path.to_path_buf()))
}

fn encode_png(canvas: RgbaImage) -> Result<Vec<u8>, RenderError> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(canvas)
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(buf.into_inner())
}
