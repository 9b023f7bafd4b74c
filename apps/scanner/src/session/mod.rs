//! Session controller — the single mutable session record and the named transitions over it.
//!
//! The process hosts exactly one session. Handlers share the controller through
//! `Arc` and only ever change state through the methods below.
//!
//! Phases:
//! - Idle: no result, no analysis error, not loading (a validation message may show)
//! - Loading: one analysis call in flight
//! - Success: result populated
//! - Error: analysis failed, no result
//!
//! The session lock is never held across the analyzer await. The loading flag,
//! not the lock, is what keeps a second scan from starting.

pub mod theme;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::analysis::{
    AnalysisRequest, AnalysisResult, Analyzer, ResumeAttachment, ValidationError,
};

pub use theme::{Theme, ThemePreference};

/// Shown when the analyzer fails. The underlying detail only goes to the log.
pub const ANALYSIS_FAILED_MESSAGE: &str =
    "Failed to analyze resume. Please try again or check your input.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Validation,
    Analysis,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionError {
    pub kind: ErrorKind,
    pub message: String,
}

impl SessionError {
    fn validation(e: &ValidationError) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: e.to_string(),
        }
    }

    fn analysis() -> Self {
        Self {
            kind: ErrorKind::Analysis,
            message: ANALYSIS_FAILED_MESSAGE.to_string(),
        }
    }
}

/// What the UI needs to know about the current attachment. The payload stays private.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentSummary {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: usize,
}

impl From<&ResumeAttachment> for AttachmentSummary {
    fn from(file: &ResumeAttachment) -> Self {
        Self {
            name: file.name().to_string(),
            mime_type: file.mime_type().to_string(),
            size_bytes: file.size_bytes(),
        }
    }
}

/// Read-only copy of the session handed to renderers and the JSON API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub job_description: String,
    pub resume_text: String,
    pub resume_file: Option<AttachmentSummary>,
    pub result: Option<AnalysisResult>,
    pub analyzed_at: Option<DateTime<Utc>>,
    pub loading: bool,
    pub error: Option<SessionError>,
    pub theme: Theme,
    pub can_scan: bool,
}

/// Result of a `run_scan` call.
#[derive(Debug, PartialEq)]
pub enum ScanOutcome {
    /// Result stored; session is in Success.
    Completed,
    /// Analyzer failed; session is in Error.
    Failed,
    /// Inputs incomplete; analyzer never called.
    Rejected(ValidationError),
    /// A scan was already in flight; nothing happened.
    AlreadyRunning,
    /// The session was reset while the scan ran; its outcome was dropped.
    Discarded,
}

#[derive(Debug)]
struct Session {
    job_description: String,
    resume_text: String,
    resume_file: Option<ResumeAttachment>,
    result: Option<AnalysisResult>,
    analyzed_at: Option<DateTime<Utc>>,
    loading: bool,
    error: Option<SessionError>,
    theme: Theme,
    /// Bumped on every reset.
    epoch: u64,
}

impl Session {
    fn new(theme: Theme) -> Self {
        Self {
            job_description: String::new(),
            resume_text: String::new(),
            resume_file: None,
            result: None,
            analyzed_at: None,
            loading: false,
            error: None,
            theme,
            epoch: 0,
        }
    }

    fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if matches!(&self.error, Some(e) if e.kind == ErrorKind::Analysis) {
            Phase::Error
        } else if self.result.is_some() {
            Phase::Success
        } else {
            Phase::Idle
        }
    }

    fn can_scan(&self) -> bool {
        !self.loading
            && !self.job_description.trim().is_empty()
            && (!self.resume_text.trim().is_empty() || self.resume_file.is_some())
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase(),
            job_description: self.job_description.clone(),
            resume_text: self.resume_text.clone(),
            resume_file: self.resume_file.as_ref().map(AttachmentSummary::from),
            result: self.result.clone(),
            analyzed_at: self.analyzed_at,
            loading: self.loading,
            error: self.error.clone(),
            theme: self.theme,
            can_scan: self.can_scan(),
        }
    }
}

pub struct SessionController {
    session: Mutex<Session>,
    analyzer: Arc<dyn Analyzer>,
}

impl SessionController {
    pub fn new(analyzer: Arc<dyn Analyzer>, theme: Theme) -> Self {
        Self {
            session: Mutex::new(Session::new(theme)),
            analyzer,
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().await.snapshot()
    }

    pub async fn set_job_description(&self, text: String) {
        self.session.lock().await.job_description = text;
    }

    pub async fn set_resume_text(&self, text: String) {
        self.session.lock().await.resume_text = text;
    }

    /// Replaces any previous attachment.
    pub async fn attach_resume_file(&self, file: ResumeAttachment) {
        info!(
            name = file.name(),
            mime_type = file.mime_type(),
            size_bytes = file.size_bytes(),
            "Resume file attached"
        );
        self.session.lock().await.resume_file = Some(file);
    }

    pub async fn clear_resume_file(&self) {
        self.session.lock().await.resume_file = None;
    }

    /// Surfaces an input problem found outside the controller, e.g. a rejected upload.
    pub async fn record_validation_error(&self, e: &ValidationError) {
        info!("Validation failed: {e}");
        self.session.lock().await.error = Some(SessionError::validation(e));
    }

    /// "New Scan": clears inputs, result, and error. The theme is kept.
    ///
    /// A scan in flight keeps the loading flag; its outcome is discarded when it lands.
    pub async fn reset(&self) {
        let mut session = self.session.lock().await;
        session.job_description.clear();
        session.resume_text.clear();
        session.resume_file = None;
        session.result = None;
        session.analyzed_at = None;
        session.error = None;
        session.epoch += 1;
        info!(in_flight = session.loading, "Session reset");
    }

    pub async fn toggle_theme(&self) -> Theme {
        let mut session = self.session.lock().await;
        session.theme = session.theme.toggled();
        session.theme
    }

    /// "Run Scan". Validates inputs, moves to Loading, calls the analyzer once,
    /// and applies the outcome.
    ///
    /// The analyzer call runs on its own task so it completes even if the
    /// caller is dropped midway, which would otherwise leave the session stuck
    /// in Loading.
    pub async fn run_scan(self: &Arc<Self>) -> ScanOutcome {
        let scan_id = Uuid::new_v4();

        let (request, epoch) = {
            let mut session = self.session.lock().await;
            if session.loading {
                warn!(%scan_id, "Scan requested while another is in flight; ignoring");
                return ScanOutcome::AlreadyRunning;
            }

            let request = match AnalysisRequest::new(
                &session.job_description,
                &session.resume_text,
                session.resume_file.clone(),
            ) {
                Ok(request) => request,
                Err(e) => {
                    info!(%scan_id, "Scan rejected: {e}");
                    session.error = Some(SessionError::validation(&e));
                    return ScanOutcome::Rejected(e);
                }
            };

            session.loading = true;
            session.error = None;
            session.result = None;
            session.analyzed_at = None;
            (request, session.epoch)
        };

        let controller = Arc::clone(self);
        let span = info_span!("scan", %scan_id);
        let task = tokio::spawn(
            async move { controller.complete_scan(request, epoch).await }.instrument(span),
        );

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(%scan_id, "Scan task aborted: {e}");
                let mut session = self.session.lock().await;
                session.loading = false;
                if session.epoch == epoch {
                    session.error = Some(SessionError::analysis());
                }
                ScanOutcome::Failed
            }
        }
    }

    async fn complete_scan(&self, request: AnalysisRequest, epoch: u64) -> ScanOutcome {
        info!(
            has_text = request.resume_text().is_some(),
            has_file = request.resume_file().is_some(),
            "Analysis started"
        );
        let outcome = self.analyzer.analyze(&request).await;

        let mut session = self.session.lock().await;
        session.loading = false;

        if session.epoch != epoch {
            info!("Session was reset during analysis; discarding outcome");
            return ScanOutcome::Discarded;
        }

        match outcome {
            Ok(result) => {
                info!(
                    match_score = result.match_score,
                    verdict = %result.verdict,
                    "Analysis completed"
                );
                session.result = Some(result);
                session.analyzed_at = Some(Utc::now());
                ScanOutcome::Completed
            }
            Err(e) => {
                error!(detail = e.detail(), "Analysis failed");
                session.error = Some(SessionError::analysis());
                ScanOutcome::Failed
            }
        }
    }
}
