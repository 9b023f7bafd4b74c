//! JSON API over the session. Same transitions as the HTML surface; every
//! handler answers with the resulting snapshot.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::analysis::ResumeAttachment;
use crate::errors::AppError;
use crate::session::{ScanOutcome, SessionSnapshot};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

/// Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInputsRequest {
    pub job_description: Option<String>,
    pub resume_text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentUpload {
    pub name: String,
    pub mime_type: String,
    /// Base64-encoded file content.
    pub data: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/session
pub async fn handle_get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.controller.snapshot().await)
}

/// PUT /api/session/inputs
pub async fn handle_update_inputs(
    State(state): State<AppState>,
    Json(request): Json<UpdateInputsRequest>,
) -> Json<SessionSnapshot> {
    if let Some(text) = request.job_description {
        state.controller.set_job_description(text).await;
    }
    if let Some(text) = request.resume_text {
        state.controller.set_resume_text(text).await;
    }
    Json(state.controller.snapshot().await)
}

/// POST /api/session/attachment
pub async fn handle_attach(
    State(state): State<AppState>,
    Json(upload): Json<AttachmentUpload>,
) -> Result<Json<SessionSnapshot>, AppError> {
    match ResumeAttachment::from_base64(
        &upload.name,
        &upload.mime_type,
        &upload.data,
        state.config.max_upload_bytes,
    ) {
        Ok(file) => {
            state.controller.attach_resume_file(file).await;
            Ok(Json(state.controller.snapshot().await))
        }
        Err(e) => {
            state.controller.record_validation_error(&e).await;
            Err(e.into())
        }
    }
}

/// DELETE /api/session/attachment
pub async fn handle_detach(State(state): State<AppState>) -> Json<SessionSnapshot> {
    state.controller.clear_resume_file().await;
    Json(state.controller.snapshot().await)
}

/// POST /api/session/scan
///
/// Waits for the analysis to finish. An analyzer failure is still a 200: the
/// snapshot carries the Error phase and the user-facing message.
pub async fn handle_scan(State(state): State<AppState>) -> Result<Json<SessionSnapshot>, AppError> {
    match state.controller.run_scan().await {
        ScanOutcome::Rejected(e) => Err(e.into()),
        ScanOutcome::AlreadyRunning => Err(AppError::ScanInProgress),
        ScanOutcome::Completed | ScanOutcome::Failed | ScanOutcome::Discarded => {
            Ok(Json(state.controller.snapshot().await))
        }
    }
}

/// POST /api/session/reset
pub async fn handle_reset(State(state): State<AppState>) -> Json<SessionSnapshot> {
    state.controller.reset().await;
    Json(state.controller.snapshot().await)
}

/// POST /api/session/theme
pub async fn handle_toggle_theme(State(state): State<AppState>) -> Json<SessionSnapshot> {
    state.controller.toggle_theme().await;
    Json(state.controller.snapshot().await)
}
