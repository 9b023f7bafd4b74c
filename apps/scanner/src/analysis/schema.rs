//! Data contract between the scanner and the model: what goes out, what must come back.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest valid `matchScore`.
pub const MAX_MATCH_SCORE: u8 = 100;

// ────────────────────────────────────────────────────────────────────────────
// Result
// ────────────────────────────────────────────────────────────────────────────

/// One likely interview question and why the interviewer would ask it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InterviewQuestion {
    pub question: String,
    pub reasoning: String,
}

/// The structured report returned by the model.
///
/// Every field is required on the wire. A response with a missing list is
/// rejected rather than defaulted, so the renderer never sees a partial report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AnalysisResult {
    pub match_score: u8,
    pub verdict: String,
    pub score_reasoning: String,
    pub missing_keywords: Vec<String>,
    pub red_flags: Vec<String>,
    pub growth_roadmap: Vec<String>,
    pub interview_prep: Vec<InterviewQuestion>,
}

#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("matchScore {0} is outside 0-{MAX_MATCH_SCORE}")]
    ScoreOutOfRange(u8),

    #[error("verdict is blank")]
    BlankVerdict,

    #[error("interviewPrep[{0}] has a blank question")]
    BlankQuestion(usize),
}

impl AnalysisResult {
    /// Semantic checks that serde's shape enforcement cannot express.
    pub fn check(&self) -> Result<(), SchemaError> {
        if self.match_score > MAX_MATCH_SCORE {
            return Err(SchemaError::ScoreOutOfRange(self.match_score));
        }
        if self.verdict.trim().is_empty() {
            return Err(SchemaError::BlankVerdict);
        }
        if let Some(i) = self
            .interview_prep
            .iter()
            .position(|q| q.question.trim().is_empty())
        {
            return Err(SchemaError::BlankQuestion(i));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Input validation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("Please provide both a Job Description and a Resume (Text or File).")]
    MissingInput,

    #[error("Unsupported resume file type '{0}'. Upload a PDF, image, or plain-text file.")]
    UnsupportedFileType(String),

    #[error("Resume file '{0}' is empty.")]
    EmptyFile(String),

    #[error("Resume file is too large ({size} bytes, limit is {limit} bytes).")]
    FileTooLarge { size: usize, limit: usize },

    #[error("Resume file is too large (limit is {limit} bytes).")]
    UploadTooLarge { limit: usize },

    #[error("Resume file data is not valid base64.")]
    InvalidEncoding,

    #[error("Resume text file '{0}' is not valid UTF-8.")]
    InvalidText(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Attachment
// ────────────────────────────────────────────────────────────────────────────

/// How an attachment is handed to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Pdf,
    Image,
    Text,
}

/// Supported MIME types and the file extensions that imply them.
const SUPPORTED_TYPES: &[(&str, AttachmentKind, &[&str])] = &[
    ("application/pdf", AttachmentKind::Pdf, &["pdf"]),
    ("image/png", AttachmentKind::Image, &["png"]),
    ("image/jpeg", AttachmentKind::Image, &["jpg", "jpeg"]),
    ("image/gif", AttachmentKind::Image, &["gif"]),
    ("image/webp", AttachmentKind::Image, &["webp"]),
    ("text/plain", AttachmentKind::Text, &["txt"]),
    ("text/markdown", AttachmentKind::Text, &["md", "markdown"]),
];

/// Resolves the MIME type to use for an upload.
///
/// A declared supported type wins. A missing or generic declaration falls back
/// to the file extension. Anything else is unsupported.
pub fn resolve_mime_type(name: &str, declared: Option<&str>) -> Option<&'static str> {
    let declared = declared
        .map(|d| d.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
        .filter(|d| !d.is_empty());

    match declared.as_deref() {
        Some(mime) if mime != "application/octet-stream" => SUPPORTED_TYPES
            .iter()
            .find(|(m, _, _)| *m == mime)
            .map(|(m, _, _)| *m),
        _ => {
            let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
            SUPPORTED_TYPES
                .iter()
                .find(|(_, _, exts)| exts.contains(&ext.as_str()))
                .map(|(m, _, _)| *m)
        }
    }
}

/// A resume supplied as a file. Only constructed through validating constructors.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeAttachment {
    name: String,
    mime_type: &'static str,
    data: String,
    size_bytes: usize,
}

impl ResumeAttachment {
    /// Builds an attachment from raw upload bytes.
    pub fn from_bytes(
        name: &str,
        declared_mime: Option<&str>,
        bytes: &[u8],
        max_bytes: usize,
    ) -> Result<Self, ValidationError> {
        let mime_type = resolve_mime_type(name, declared_mime).ok_or_else(|| {
            ValidationError::UnsupportedFileType(
                declared_mime
                    .filter(|m| !m.is_empty())
                    .unwrap_or(name)
                    .to_string(),
            )
        })?;

        if bytes.is_empty() {
            return Err(ValidationError::EmptyFile(name.to_string()));
        }
        if bytes.len() > max_bytes {
            return Err(ValidationError::FileTooLarge {
                size: bytes.len(),
                limit: max_bytes,
            });
        }
        if kind_of(mime_type) == AttachmentKind::Text && std::str::from_utf8(bytes).is_err() {
            return Err(ValidationError::InvalidText(name.to_string()));
        }

        Ok(Self {
            name: display_name(name),
            mime_type,
            data: BASE64.encode(bytes),
            size_bytes: bytes.len(),
        })
    }

    /// Builds an attachment from an already base64-encoded payload.
    pub fn from_base64(
        name: &str,
        declared_mime: &str,
        data: &str,
        max_bytes: usize,
    ) -> Result<Self, ValidationError> {
        let bytes = BASE64
            .decode(data.trim())
            .map_err(|_| ValidationError::InvalidEncoding)?;
        Self::from_bytes(name, Some(declared_mime), &bytes, max_bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    /// Base64-encoded file content.
    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn kind(&self) -> AttachmentKind {
        kind_of(self.mime_type)
    }

    /// Decoded content of a text attachment.
    pub fn text_content(&self) -> Option<String> {
        if self.kind() != AttachmentKind::Text {
            return None;
        }
        let bytes = BASE64.decode(&self.data).ok()?;
        String::from_utf8(bytes).ok()
    }
}

fn kind_of(mime_type: &str) -> AttachmentKind {
    SUPPORTED_TYPES
        .iter()
        .find(|(m, _, _)| *m == mime_type)
        .map(|(_, kind, _)| *kind)
        .unwrap_or(AttachmentKind::Pdf)
}

/// Browsers may send a full path on some platforms; keep only the file name.
fn display_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    if base.is_empty() {
        "resume".to_string()
    } else {
        base.to_string()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Request
// ────────────────────────────────────────────────────────────────────────────

/// A validated analysis request. Holding one proves the inputs are complete.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    job_description: String,
    resume_text: Option<String>,
    resume_file: Option<ResumeAttachment>,
}

impl AnalysisRequest {
    /// Requires a non-blank job description plus non-blank resume text or a file.
    /// Blank resume text is dropped so it never reaches the model.
    pub fn new(
        job_description: &str,
        resume_text: &str,
        resume_file: Option<ResumeAttachment>,
    ) -> Result<Self, ValidationError> {
        let job_description = job_description.trim();
        let resume_text = Some(resume_text.trim()).filter(|t| !t.is_empty());

        if job_description.is_empty() || (resume_text.is_none() && resume_file.is_none()) {
            return Err(ValidationError::MissingInput);
        }

        Ok(Self {
            job_description: job_description.to_string(),
            resume_text: resume_text.map(String::from),
            resume_file,
        })
    }

    pub fn job_description(&self) -> &str {
        &self.job_description
    }

    pub fn resume_text(&self) -> Option<&str> {
        self.resume_text.as_deref()
    }

    pub fn resume_file(&self) -> Option<&ResumeAttachment> {
        self.resume_file.as_ref()
    }
}
