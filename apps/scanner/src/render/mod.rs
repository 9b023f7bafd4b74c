//! Presentation — renders a session snapshot into the two-region page.
//!
//! Pure functions of `SessionSnapshot`; no state of their own.

pub mod icons;

use askama::Template;

use crate::analysis::AnalysisResult;
use crate::session::{ErrorKind, SessionSnapshot};
use icons::{Icons, ICONS};

/// Score bands used to color the match score.
pub fn score_band(score: u8) -> &'static str {
    match score {
        75..=u8::MAX => "high",
        50..=74 => "medium",
        _ => "low",
    }
}

/// "12.4 KB" style sizes for the attachment chip.
pub fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let bytes_f = bytes as f64;
    if bytes_f < KB {
        format!("{bytes} B")
    } else if bytes_f < KB * KB {
        format!("{:.1} KB", bytes_f / KB)
    } else {
        format!("{:.1} MB", bytes_f / (KB * KB))
    }
}

pub struct AttachmentView<'a> {
    pub name: &'a str,
    pub mime_type: &'a str,
    pub size: String,
}

pub struct ErrorView<'a> {
    pub message: &'a str,
    pub is_validation: bool,
}

pub struct ReportView<'a> {
    pub result: &'a AnalysisResult,
    pub band: &'static str,
    pub analyzed_at: String,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage<'a> {
    pub dark: bool,
    pub loading: bool,
    pub can_scan: bool,
    pub job_description: &'a str,
    pub resume_text: &'a str,
    pub attachment: Option<AttachmentView<'a>>,
    pub error: Option<ErrorView<'a>>,
    pub report: Option<ReportView<'a>>,
    pub model: &'a str,
    pub icons: Icons,
}

impl<'a> IndexPage<'a> {
    pub fn new(snapshot: &'a SessionSnapshot, model: &'a str) -> Self {
        Self {
            dark: snapshot.theme.is_dark(),
            loading: snapshot.loading,
            can_scan: snapshot.can_scan,
            job_description: &snapshot.job_description,
            resume_text: &snapshot.resume_text,
            attachment: snapshot.resume_file.as_ref().map(|f| AttachmentView {
                name: &f.name,
                mime_type: &f.mime_type,
                size: format_size(f.size_bytes),
            }),
            error: snapshot.error.as_ref().map(|e| ErrorView {
                message: &e.message,
                is_validation: e.kind == ErrorKind::Validation,
            }),
            report: snapshot.result.as_ref().map(|result| ReportView {
                result,
                band: score_band(result.match_score),
                analyzed_at: snapshot
                    .analyzed_at
                    .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                    .unwrap_or_default(),
            }),
            model,
            icons: ICONS,
        }
    }
}

pub fn render_page(snapshot: &SessionSnapshot, model: &str) -> Result<String, askama::Error> {
    IndexPage::new(snapshot, model).render()
}
