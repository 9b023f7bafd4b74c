// All LLM prompt constants for the analysis module.
// Reuses the JSON-only fragment from llm_client::prompts.

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;

/// Role preamble for the analysis system prompt. Joined with `JSON_ONLY_SYSTEM`.
pub const ANALYSIS_ROLE: &str = "You are an expert Applicant Tracking System (ATS) scanner \
    and senior technical recruiter. You compare a candidate's resume against a job \
    description and produce a candid, structured assessment.";

pub fn analysis_system() -> String {
    format!("{ANALYSIS_ROLE} {JSON_ONLY_SYSTEM}")
}

/// Analysis prompt template.
/// Replace: {job_description}, {resume_section}
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze how well the candidate's resume matches the job description below.

Return a JSON object with this EXACT schema (all fields required, no extra fields):
{
  "matchScore": 82,
  "verdict": "Strong Match",
  "scoreReasoning": "Two to four sentences explaining the score.",
  "missingKeywords": ["Kubernetes"],
  "redFlags": ["Six-month gap in 2022 is unexplained"],
  "growthRoadmap": ["Deploy a side project on Kubernetes and link it from the resume"],
  "interviewPrep": [
    {
      "question": "Walk me through how you would shard a hot Postgres table.",
      "reasoning": "The role owns high-write services and the resume never mentions partitioning."
    }
  ]
}

FIELD RULES:
- matchScore: integer from 0 to 100. Weigh hard requirements above nice-to-haves.
- verdict: a short label such as "Strong Match", "Good Match", "Partial Match", or "Weak Match".
- scoreReasoning: plain text, no markdown.
- missingKeywords: skills, tools, or qualifications the job asks for that the resume does not show, most important first.
- redFlags: anything a recruiter would question (gaps, job hopping, vague claims, missing required credentials). Use [] if none.
- growthRoadmap: concrete, ordered steps the candidate can take to close the gaps.
- interviewPrep: 3 to 5 questions the candidate is likely to face for THIS role, each with the reasoning behind it.
- Every list field MUST be present, even when empty.

JOB DESCRIPTION:
{job_description}

{resume_section}"#;

/// Resume section when the candidate pasted text.
/// Replace: {resume_text}
pub const RESUME_TEXT_SECTION: &str = "RESUME (pasted text):\n{resume_text}";

/// Resume section when the candidate uploaded a file.
/// Replace: {file_name}
pub const RESUME_FILE_SECTION: &str =
    "RESUME (attached file \"{file_name}\"): read the attached document as the candidate's resume.";
