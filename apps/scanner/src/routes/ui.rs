//! HTML surface. Every action is a form post mapped to one controller
//! transition, answered with a redirect back to the page.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{Html, Redirect},
};
use tracing::{debug, warn};

use crate::analysis::{ResumeAttachment, ValidationError};
use crate::errors::AppError;
use crate::llm_client::MODEL;
use crate::render::render_page;
use crate::state::AppState;

#[derive(Default)]
struct ScanForm {
    job_description: Option<String>,
    resume_text: Option<String>,
    upload: Option<RawUpload>,
}

/// An uploaded file as received, before validation.
struct RawUpload {
    file_name: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// GET /
pub async fn handle_index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let snapshot = state.controller.snapshot().await;
    Ok(Html(render_page(&snapshot, MODEL)?))
}

/// POST /scan
///
/// Applies the submitted inputs, then runs the scan. A rejected upload stops
/// before the scan and keeps the previous attachment.
pub async fn handle_scan(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Redirect, AppError> {
    let mut form = ScanForm::default();
    let read = read_scan_form(&mut multipart, &mut form).await;

    // Text fields read before a failed upload are kept.
    let controller = &state.controller;
    if let Some(text) = form.job_description {
        controller.set_job_description(text).await;
    }
    if let Some(text) = form.resume_text {
        controller.set_resume_text(text).await;
    }

    match read {
        Ok(()) => {}
        Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            warn!("Form body exceeded the request limit: {e}");
            controller
                .record_validation_error(&ValidationError::UploadTooLarge {
                    limit: state.config.max_upload_bytes,
                })
                .await;
            return Ok(Redirect::to("/"));
        }
        Err(e) => return Err(e.into()),
    }

    if let Some(raw) = form.upload {
        match ResumeAttachment::from_bytes(
            &raw.file_name,
            raw.content_type.as_deref(),
            &raw.bytes,
            state.config.max_upload_bytes,
        ) {
            Ok(file) => controller.attach_resume_file(file).await,
            Err(e) => {
                controller.record_validation_error(&e).await;
                return Ok(Redirect::to("/"));
            }
        }
    }

    let outcome = controller.run_scan().await;
    debug!(?outcome, "Scan form handled");
    Ok(Redirect::to("/"))
}

/// Reads the scan form fields into `form`, stopping at the first stream error.
async fn read_scan_form(
    multipart: &mut Multipart,
    form: &mut ScanForm,
) -> Result<(), MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "job_description" => form.job_description = Some(field.text().await?),
            "resume_text" => form.resume_text = Some(field.text().await?),
            "resume_file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                // An untouched file input still submits an empty, unnamed part.
                if !file_name.is_empty() || !bytes.is_empty() {
                    form.upload = Some(RawUpload {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            other => debug!("Ignoring unknown form field '{other}'"),
        }
    }
    Ok(())
}

/// POST /resume-file/clear
pub async fn handle_clear_resume_file(State(state): State<AppState>) -> Redirect {
    state.controller.clear_resume_file().await;
    Redirect::to("/")
}

/// POST /reset
pub async fn handle_reset(State(state): State<AppState>) -> Redirect {
    state.controller.reset().await;
    Redirect::to("/")
}

/// POST /theme
pub async fn handle_toggle_theme(State(state): State<AppState>) -> Redirect {
    state.controller.toggle_theme().await;
    Redirect::to("/")
}
