//! Analysis client — turns an `AnalysisRequest` into one model call and a validated report.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::analysis::prompts::{
    analysis_system, ANALYSIS_PROMPT_TEMPLATE, RESUME_FILE_SECTION, RESUME_TEXT_SECTION,
};
use crate::analysis::schema::{AnalysisRequest, AnalysisResult, AttachmentKind, SchemaError};
use crate::llm_client::{parse_json_text, BlockSource, ContentBlock, LlmClient, LlmError};

/// Opaque analysis failure. Callers only need success or failure; `detail` is for logs.
#[derive(Debug, Error)]
#[error("analysis failed: {detail}")]
pub struct AnalysisError {
    detail: String,
}

impl AnalysisError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl From<LlmError> for AnalysisError {
    fn from(e: LlmError) -> Self {
        AnalysisError::new(e.to_string())
    }
}

impl From<SchemaError> for AnalysisError {
    fn from(e: SchemaError) -> Self {
        AnalysisError::new(format!("schema violation: {e}"))
    }
}

/// The analysis seam. The controller holds an `Arc<dyn Analyzer>`, so tests can
/// drive it without a network.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError>;
}

/// Production analyzer backed by the Claude Messages API.
pub struct LlmAnalyzer(pub LlmClient);

#[async_trait]
impl Analyzer for LlmAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        let content = build_content(request)?;
        debug!(blocks = content.len(), "Sending analysis request");

        let response = self.0.call(&content, &analysis_system()).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        parse_analysis(text)
    }
}

/// Builds the user content: the attachment block first (if any), then the prompt.
pub fn build_content(request: &AnalysisRequest) -> Result<Vec<ContentBlock>, AnalysisError> {
    let mut blocks = Vec::with_capacity(2);

    if let Some(file) = request.resume_file() {
        let block = match file.kind() {
            AttachmentKind::Pdf => ContentBlock::Document {
                source: BlockSource::Base64 {
                    media_type: file.mime_type().to_string(),
                    data: file.data().to_string(),
                },
                title: Some(file.name().to_string()),
            },
            AttachmentKind::Image => ContentBlock::Image {
                source: BlockSource::Base64 {
                    media_type: file.mime_type().to_string(),
                    data: file.data().to_string(),
                },
            },
            AttachmentKind::Text => {
                let text = file.text_content().ok_or_else(|| {
                    AnalysisError::new(format!("attachment '{}' is not readable text", file.name()))
                })?;
                // The API only accepts text/plain for text documents.
                ContentBlock::Document {
                    source: BlockSource::Text {
                        media_type: "text/plain".to_string(),
                        data: text,
                    },
                    title: Some(file.name().to_string()),
                }
            }
        };
        blocks.push(block);
    }

    blocks.push(ContentBlock::text(build_prompt(request)));
    Ok(blocks)
}

fn build_prompt(request: &AnalysisRequest) -> String {
    let mut sections = Vec::new();
    if let Some(file) = request.resume_file() {
        sections.push(RESUME_FILE_SECTION.replace("{file_name}", file.name()));
    }
    if let Some(text) = request.resume_text() {
        sections.push(RESUME_TEXT_SECTION.replace("{resume_text}", text));
    }

    fill_template(
        ANALYSIS_PROMPT_TEMPLATE,
        &[
            ("job_description", request.job_description()),
            ("resume_section", &sections.join("\n\n")),
        ],
    )
}

/// Fills `{name}` placeholders in one pass. Inserted values are never rescanned,
/// so user text that happens to contain a placeholder stays literal.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let hit = values
            .iter()
            .find(|(key, _)| tail.starts_with(key) && tail[key.len()..].starts_with('}'));
        match hit {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Parses and validates raw model output. Any deviation from the schema fails.
pub fn parse_analysis(text: &str) -> Result<AnalysisResult, AnalysisError> {
    let result: AnalysisResult = parse_json_text(text)?;
    result.check()?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    use super::*;
    use crate::analysis::schema::ResumeAttachment;

    const MAX: usize = 1 << 20;

    const VALID: &str = r#"{
        "matchScore": 82,
        "verdict": "Strong Match",
        "scoreReasoning": "Deep backend experience.",
        "missingKeywords": ["Kafka"],
        "redFlags": [],
        "growthRoadmap": ["Build a streaming pipeline"],
        "interviewPrep": [{"question": "Explain exactly-once delivery.", "reasoning": "Kafka-heavy role."}]
    }"#;

    fn text_request() -> AnalysisRequest {
        AnalysisRequest::new(
            "Senior Backend Engineer. Rust, Postgres, Kafka.",
            "5 years experience building Rust services.",
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_analysis_accepts_valid_json() {
        let result = parse_analysis(VALID).unwrap();
        assert_eq!(result.match_score, 82);
        assert_eq!(result.verdict, "Strong Match");
    }

    #[test]
    fn test_parse_analysis_accepts_fenced_json() {
        let fenced = format!("```json\n{VALID}\n```");
        assert!(parse_analysis(&fenced).is_ok());
    }

    #[test]
    fn test_parse_analysis_rejects_commentary() {
        let chatty = format!("Sure! Here is the report:\n{VALID}");
        assert!(parse_analysis(&chatty).is_err());
    }

    #[test]
    fn test_parse_analysis_rejects_missing_list() {
        let missing = VALID.replace(r#""redFlags": [],"#, "");
        let err = parse_analysis(&missing).unwrap_err();
        assert!(err.detail().contains("redFlags"));
    }

    #[test]
    fn test_parse_analysis_rejects_out_of_range_score() {
        let high = VALID.replace("82", "101");
        let err = parse_analysis(&high).unwrap_err();
        assert!(err.detail().contains("schema violation"));
    }

    #[test]
    fn test_parse_analysis_rejects_null_list() {
        let null = VALID.replace(r#""redFlags": []"#, r#""redFlags": null"#);
        assert!(parse_analysis(&null).is_err());
    }

    #[test]
    fn test_placeholders_in_user_text_stay_literal() {
        let request = AnalysisRequest::new(
            "Staff Engineer, payments platform. Ref {resume_section}",
            "My notes: {job_description}",
            None,
        )
        .unwrap();
        let blocks = build_content(&request).unwrap();
        let ContentBlock::Text { text } = &blocks[0] else {
            panic!("expected text block");
        };
        assert_eq!(text.matches("Staff Engineer, payments platform.").count(), 1);
        assert!(text.contains("My notes: {job_description}"));
        assert!(text.contains("Ref {resume_section}"));
    }

    #[test]
    fn test_fill_template_leaves_unknown_braces() {
        let filled = fill_template(r#"{"a": {x}, "b": {y"#, &[("x", "1")]);
        assert_eq!(filled, r#"{"a": 1, "b": {y"#);
    }

    #[test]
    fn test_text_only_request_is_single_text_block() {
        let blocks = build_content(&text_request()).unwrap();
        assert_eq!(blocks.len(), 1);
        let ContentBlock::Text { text } = &blocks[0] else {
            panic!("expected text block");
        };
        assert!(text.contains("Senior Backend Engineer. Rust, Postgres, Kafka."));
        assert!(text.contains("5 years experience building Rust services."));
        assert!(text.contains("\"interviewPrep\""));
        assert!(!text.contains("{job_description}"));
        assert!(!text.contains("{resume_section}"));
    }

    #[test]
    fn test_file_only_request_sends_document_and_no_resume_text() {
        let file = ResumeAttachment::from_bytes("cv.pdf", Some("application/pdf"), b"%PDF-1.7", MAX)
            .unwrap();
        let request = AnalysisRequest::new("Senior Backend Engineer", "", Some(file)).unwrap();

        let blocks = build_content(&request).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[0],
            ContentBlock::Document {
                source: BlockSource::Base64 {
                    media_type: "application/pdf".to_string(),
                    data: "JVBERi0xLjc=".to_string(),
                },
                title: Some("cv.pdf".to_string()),
            }
        );
        let ContentBlock::Text { text } = &blocks[1] else {
            panic!("expected text block");
        };
        assert!(text.contains("attached file \"cv.pdf\""));
        assert!(!text.contains("pasted text"));
    }

    #[test]
    fn test_image_attachment_becomes_image_block() {
        let file = ResumeAttachment::from_bytes("cv.png", None, &[0x89, b'P', b'N', b'G'], MAX)
            .unwrap();
        let request = AnalysisRequest::new("Designer", "", Some(file)).unwrap();
        let blocks = build_content(&request).unwrap();
        assert!(matches!(blocks[0], ContentBlock::Image { .. }));
    }

    #[test]
    fn test_text_attachment_becomes_plain_text_document() {
        let file = ResumeAttachment::from_bytes("cv.md", None, b"# Jane Doe", MAX).unwrap();
        let request = AnalysisRequest::new("Writer", "", Some(file)).unwrap();
        let blocks = build_content(&request).unwrap();
        assert_eq!(
            blocks[0],
            ContentBlock::Document {
                source: BlockSource::Text {
                    media_type: "text/plain".to_string(),
                    data: "# Jane Doe".to_string(),
                },
                title: Some("cv.md".to_string()),
            }
        );
    }

    #[test]
    fn test_text_and_file_both_reach_prompt() {
        let file = ResumeAttachment::from_bytes("cv.pdf", None, b"%PDF", MAX).unwrap();
        let request = AnalysisRequest::new("Engineer", "Also led a team of 4.", Some(file)).unwrap();
        let blocks = build_content(&request).unwrap();
        let ContentBlock::Text { text } = &blocks[1] else {
            panic!("expected text block");
        };
        assert!(text.contains("attached file"));
        assert!(text.contains("Also led a team of 4."));
    }

    /// Serves a canned Messages API reply on a local port and records each request body.
    async fn fake_api(status: StatusCode, reply: Value) -> (LlmClient, Arc<Mutex<Vec<Value>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handler = {
            let seen = Arc::clone(&seen);
            move |Json(request): Json<Value>| {
                let seen = Arc::clone(&seen);
                let reply = reply.clone();
                async move {
                    seen.lock().unwrap().push(request);
                    (status, Json(reply))
                }
            }
        };
        let app = Router::new().route("/v1/messages", post(handler));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let client = LlmClient::new(
            "test-key".to_string(),
            format!("http://{addr}/v1/messages"),
            Duration::from_secs(5),
        )
        .unwrap();
        (client, seen)
    }

    fn text_reply(text: &str) -> Value {
        json!({
            "content": [{"type": "text", "text": text}],
            "usage": {"input_tokens": 1200, "output_tokens": 300}
        })
    }

    #[tokio::test]
    async fn test_llm_analyzer_returns_validated_result() {
        let (client, seen) = fake_api(StatusCode::OK, text_reply(VALID)).await;

        let result = LlmAnalyzer(client).analyze(&text_request()).await.unwrap();
        assert_eq!(result.match_score, 82);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["model"], crate::llm_client::MODEL);
        assert!(seen[0]["system"].as_str().unwrap().contains("valid JSON only"));
        assert_eq!(seen[0]["messages"][0]["role"], "user");
        assert_eq!(seen[0]["messages"][0]["content"][0]["type"], "text");
    }

    #[tokio::test]
    async fn test_llm_analyzer_sends_pdf_document_block() {
        let (client, seen) = fake_api(StatusCode::OK, text_reply(VALID)).await;
        let file = ResumeAttachment::from_bytes("cv.pdf", None, b"%PDF-1.7", MAX).unwrap();
        let request = AnalysisRequest::new("Senior Backend Engineer", "", Some(file)).unwrap();

        LlmAnalyzer(client).analyze(&request).await.unwrap();

        let seen = seen.lock().unwrap();
        let block = &seen[0]["messages"][0]["content"][0];
        assert_eq!(block["type"], "document");
        assert_eq!(block["source"]["type"], "base64");
        assert_eq!(block["source"]["media_type"], "application/pdf");
        assert_eq!(block["source"]["data"], "JVBERi0xLjc=");
    }

    #[tokio::test]
    async fn test_llm_analyzer_does_not_retry_server_errors() {
        let (client, seen) = fake_api(
            StatusCode::SERVICE_UNAVAILABLE,
            json!({"error": {"type": "overloaded_error", "message": "Overloaded"}}),
        )
        .await;

        let err = LlmAnalyzer(client).analyze(&text_request()).await.unwrap_err();
        assert!(err.detail().contains("503"));
        assert!(err.detail().contains("Overloaded"));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_llm_analyzer_reports_auth_failure() {
        let (client, _) = fake_api(
            StatusCode::UNAUTHORIZED,
            json!({"error": {"type": "authentication_error", "message": "invalid x-api-key"}}),
        )
        .await;

        let err = LlmAnalyzer(client).analyze(&text_request()).await.unwrap_err();
        assert!(err.detail().contains("401"));
    }

    #[tokio::test]
    async fn test_llm_analyzer_rejects_malformed_model_output() {
        let (client, _) = fake_api(StatusCode::OK, text_reply("{\"matchScore\": 82,")).await;
        assert!(LlmAnalyzer(client).analyze(&text_request()).await.is_err());
    }

    #[tokio::test]
    async fn test_llm_analyzer_rejects_reply_without_text() {
        let reply = json!({"content": [], "usage": {"input_tokens": 1, "output_tokens": 0}});
        let (client, _) = fake_api(StatusCode::OK, reply).await;
        let err = LlmAnalyzer(client).analyze(&text_request()).await.unwrap_err();
        assert!(err.detail().contains("empty content"));
    }
}
