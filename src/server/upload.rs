//! Spreadsheet and template uploads.

use std::path::{Path, PathBuf};

use axum::{
    Json,
    body::Bytes,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
};
use chrono::Utc;
use image::ImageFormat;
use serde_json::{Value, json};
use tracing::{info, warn};
use uuid::Uuid;

use super::{ApiError, AppState, MAX_UPLOAD_BYTES};
use crate::error::{Error, RenderError, ValidationError};
use crate::roster;

/// Media type of an `.xlsx` workbook.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// One file part pulled out of a multipart body.
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    /// Part `Content-Type`, when the client sent one.
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Find the file part called `field_name`. Other parts are skipped.
async fn read_file_field(
    multipart: &mut Multipart,
    field_name: &str,
) -> Result<Option<UploadedFile>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(field_name) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(ApiError::bad_request("File too large (max 10MB)"));
        }
        return Ok(Some(UploadedFile {
            file_name,
            content_type,
            bytes,
        }));
    }
    Ok(None)
}

fn multipart_error(e: MultipartError) -> ApiError {
    ApiError::bad_request(e.body_text())
}

/// Whether an upload looks like an `.xlsx` workbook: the name must carry the
/// extension, and a declared media type must be the workbook type.
pub fn is_xlsx(file_name: &str, content_type: Option<&str>) -> bool {
    let extension_ok = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));
    let mime_ok = content_type.is_none_or(|mime| {
        mime.split(';')
            .next()
            .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(XLSX_MIME))
    });
    extension_ok && mime_ok
}

/// `<millis>-<base name>`, with any client-supplied directories stripped.
pub fn stored_upload_name(file_name: &str) -> String {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.xlsx");
    format!("{}-{}", Utc::now().timestamp_millis(), base)
}

// ── Spreadsheet ─────────────────────────────────────────────────────────

pub(super) async fn upload_excel(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let upload = read_file_field(&mut multipart, "excelFile")
        .await?
        .ok_or_else(|| ApiError::bad_request("No file uploaded"))?;
    if !is_xlsx(&upload.file_name, upload.content_type.as_deref()) {
        return Err(ApiError::bad_request("Only .xlsx files are allowed!"));
    }

    let uploads_dir = &state.config.paths.uploads_dir;
    tokio::fs::create_dir_all(uploads_dir).await?;
    let path = uploads_dir.join(stored_upload_name(&upload.file_name));
    tokio::fs::write(&path, &upload.bytes).await?;

    let parsed = tokio::task::spawn_blocking({
        let path = path.clone();
        move || roster::read_workbook(&path)
    })
    .await;

    if let Err(e) = tokio::fs::remove_file(&path).await {
        warn!(path = %path.display(), error = %e, "Could not remove uploaded spreadsheet");
    }

    let recipients = parsed
        .map_err(|e| ApiError::internal(format!("Spreadsheet task failed: {e}")))?
        .map_err(|e| ApiError::bad_request(format!("Failed to process file: {e}")))?;

    info!(file = %upload.file_name, count = recipients.len(), "Spreadsheet processed");
    Ok(Json(json!({
        "message": "File processed successfully",
        "count": recipients.len(),
        "data": recipients,
    })))
}

// ── Template ────────────────────────────────────────────────────────────

pub(super) async fn upload_template(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let upload = read_file_field(&mut multipart, "templateImage")
        .await?
        .ok_or_else(|| ApiError::bad_request("No template image uploaded"))?;

    let target = state.config.paths.template_path();
    tokio::task::spawn_blocking({
        let target = target.clone();
        move || store_template(&upload.bytes, &target)
    })
    .await
    .map_err(|e| ApiError::internal(format!("Template task failed: {e}")))??;

    info!(path = %target.display(), "Template replaced");
    Ok(Json(json!({
        "message": "Template image uploaded successfully",
        "path": target.display().to_string(),
    })))
}

/// Decode `bytes` as an image and atomically replace `target` with a PNG copy.
pub fn store_template(bytes: &[u8], target: &Path) -> Result<(), Error> {
    let img = image::load_from_memory(bytes).map_err(|e| {
        ValidationError::Upload(format!("Uploaded template is not a supported image: {e}"))
    })?;

    if let Some(dir) = target.parent() {
        std::fs::create_dir_all(dir)?;
    }
    replace_via_staging(target, |staging| {
        img.save_with_format(staging, ImageFormat::Png)
            .map_err(|e| RenderError::Encode(e.to_string()).into())
    })
}

/// Run `write` against a fresh staging file next to `target`, then rename it
/// over `target`. The staging file never outlives a failure.
fn replace_via_staging<F>(target: &Path, write: F) -> Result<(), Error>
where
    F: FnOnce(&Path) -> Result<(), Error>,
{
    let staging = staging_path(target);
    let result = write(&staging).and_then(|()| std::fs::rename(&staging, target).map_err(Error::from));
    if result.is_err() {
        let _ = std::fs::remove_file(&staging);
    }
    result
}

/// `<target name>.<uuid>.uploading`, unique per upload.
fn staging_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.uploading", Uuid::new_v4().simple()));
    target.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{Rgba, RgbaImage};

    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn xlsx_extension_check() {
        assert!(is_xlsx("roster.xlsx", None));
        assert!(is_xlsx("ROSTER.XLSX", None));
        assert!(!is_xlsx("roster.xls", None));
        assert!(!is_xlsx("roster.csv", None));
        assert!(!is_xlsx("xlsx", None));
    }

    #[test]
    fn xlsx_content_type_check() {
        assert!(is_xlsx("roster.xlsx", Some(XLSX_MIME)));
        assert!(is_xlsx("roster.xlsx", Some(format!("{XLSX_MIME}; charset=binary").as_str())));
        assert!(!is_xlsx("roster.xlsx", Some("text/csv")));
        assert!(!is_xlsx("roster.xlsx", Some("application/vnd.ms-excel")));
        assert!(!is_xlsx("roster.csv", Some(XLSX_MIME)));
    }

    #[test]
    fn staging_names_are_unique() {
        let target = Path::new("/tmp/assets/template.png");
        let a = staging_path(target);
        let b = staging_path(target);
        assert_ne!(a, b);
        assert_eq!(a.parent(), target.parent());
        let name = a.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("template.png."));
        assert!(name.ends_with(".uploading"));
    }

    #[test]
    fn stored_name_strips_directories() {
        let name = stored_upload_name("../../etc/roster.xlsx");
        assert!(name.ends_with("-roster.xlsx"));
        assert!(!name.contains('/'));
        let (millis, _) = name.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
    }

    #[test]
    fn store_template_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("assets").join("template.png");

        store_template(&png_bytes(8, 4), &target).unwrap();

        let stored = image::open(&target).unwrap();
        assert_eq!((stored.width(), stored.height()), (8, 4));
        assert_eq!(dir_entries(target.parent().unwrap()), vec!["template.png"]);
    }

    #[test]
    fn store_template_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("template.png");
        store_template(&png_bytes(2, 2), &target).unwrap();
        store_template(&png_bytes(5, 3), &target).unwrap();
        let stored = image::open(&target).unwrap();
        assert_eq!(stored.width(), 5);
    }

    #[test]
    fn store_template_rejects_non_images_and_keeps_old_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("template.png");
        store_template(&png_bytes(3, 3), &target).unwrap();

        let err = store_template(b"definitely not an image", &target).unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::Upload(_))));
        assert_eq!(image::open(&target).unwrap().width(), 3);
    }

    #[test]
    fn failed_write_removes_staging_file_and_keeps_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("template.png");
        store_template(&png_bytes(3, 3), &target).unwrap();

        let err = replace_via_staging(&target, |staging| {
            std::fs::write(staging, b"half a png")?;
            Err(RenderError::Encode("disk full".into()).into())
        })
        .unwrap_err();

        assert!(matches!(err, Error::Render(RenderError::Encode(_))));
        assert_eq!(dir_entries(dir.path()), vec!["template.png"]);
        assert_eq!(image::open(&target).unwrap().width(), 3);
    }

    #[tokio::test]
    async fn concurrent_uploads_leave_one_template() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("template.png");
        let tasks: Vec<_> = (1..=4)
            .map(|width| {
                let target = target.clone();
                tokio::task::spawn_blocking(move || store_template(&png_bytes(width, 2), &target))
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(dir_entries(dir.path()), vec!["template.png"]);
        assert_eq!(image::open(&target).unwrap().height(), 2);
    }
}
