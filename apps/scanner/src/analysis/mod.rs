// Resume analysis: request/result contract, prompt construction, and response validation.
// All LLM calls go through llm_client — no direct Anthropic calls here.

pub mod client;
pub mod prompts;
pub mod schema;

pub use client::{AnalysisError, Analyzer, LlmAnalyzer};
pub use schema::{AnalysisRequest, AnalysisResult, ResumeAttachment, ValidationError};
