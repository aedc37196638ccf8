//! Resume Analysis: scores a resume section by section against a target role.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{ChatTurn, LlmClient, LlmError};
use crate::resume::prompts::{
    DEFAULT_TARGET_ROLE, RESUME_ANALYSIS_SYSTEM_TEMPLATE, RESUME_ANALYSIS_USER_TEMPLATE,
};

/// Resume text beyond this many characters is not sent to the model.
const MAX_RESUME_CHARS: usize = 20_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionStatus {
    Good,
    NeedsWork,
    Critical,
}

impl SectionStatus {
    /// good ≥ 75, needs-work 50–74, critical < 50
    pub fn from_score(score: u8) -> Self {
        match score {
            75.. => SectionStatus::Good,
            50..=74 => SectionStatus::NeedsWork,
            _ => SectionStatus::Critical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionFeedback {
    pub name: String,
    pub score: u8,
    pub status: SectionStatus,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillGap {
    pub skill: String,
    pub current: u8,
    pub target: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeAnalysis {
    pub score: u8,
    pub sections: Vec<SectionFeedback>,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub skill_gaps: Vec<SkillGap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Wire shape as returned by the model (lenient)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAnalysis {
    #[serde(alias = "overallScore")]
    score: f64,
    #[serde(default)]
    sections: Vec<RawSection>,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    improvements: Vec<String>,
    #[serde(default)]
    skill_gaps: Vec<RawSkillGap>,
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSection {
    name: String,
    score: f64,
    #[serde(default)]
    feedback: String,
}

#[derive(Debug, Deserialize)]
struct RawSkillGap {
    skill: String,
    current: f64,
    target: f64,
}

fn clamp_score(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

impl From<RawAnalysis> for ResumeAnalysis {
    /// Clamps every score to 0–100 and derives section status from the score, so the two
    /// can never disagree.
    fn from(raw: RawAnalysis) -> Self {
        let sections = raw
            .sections
            .into_iter()
            .map(|s| {
                let score = clamp_score(s.score);
                SectionFeedback {
                    name: s.name,
                    score,
                    status: SectionStatus::from_score(score),
                    feedback: s.feedback,
                }
            })
            .collect();

        let skill_gaps = raw
            .skill_gaps
            .into_iter()
            .map(|g| SkillGap {
                skill: g.skill,
                current: clamp_score(g.current),
                target: clamp_score(g.target),
            })
            .collect();

        ResumeAnalysis {
            score: clamp_score(raw.score),
            sections,
            strengths: raw.strengths,
            improvements: raw.improvements,
            skill_gaps,
            summary: raw.summary.filter(|s| !s.trim().is_empty()),
        }
    }
}

/// Extracts plain text from PDF bytes on a blocking thread.
pub async fn extract_pdf_text(pdf: Vec<u8>) -> Result<String, AppError> {
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&pdf))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(|e| AppError::UnprocessableEntity(format!("Could not read PDF: {e}")))?;

    debug!("Extracted {} chars of text from PDF", text.len());
    Ok(text)
}

pub fn build_system_prompt(target_role: Option<&str>) -> String {
    let role = target_role
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_TARGET_ROLE);
    format!(
        "{}\n\n{}",
        RESUME_ANALYSIS_SYSTEM_TEMPLATE.replace("{target_role}", role),
        JSON_ONLY_INSTRUCTION
    )
}

/// Analyzes resume text with the LLM and returns normalized feedback.
pub async fn analyze_resume(
    resume_text: &str,
    target_role: Option<&str>,
    llm: &LlmClient,
) -> Result<ResumeAnalysis, AppError> {
    let text = resume_text.trim();
    if text.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "No text could be extracted from the resume".to_string(),
        ));
    }

    let text: String = text.chars().take(MAX_RESUME_CHARS).collect();
    let system = build_system_prompt(target_role);
    let messages = [ChatTurn::user(
        RESUME_ANALYSIS_USER_TEMPLATE.replace("{resume_text}", &text),
    )];

    let raw: RawAnalysis = llm
        .call_json(&messages, &system)
        .await
        .map_err(|e| match e {
            LlmError::Parse(_) | LlmError::NoJson | LlmError::EmptyContent => {
                AppError::AnalysisParse(e.to_string())
            }
            other => AppError::from(other),
        })?;

    let analysis = ResumeAnalysis::from(raw);
    info!(
        "Resume analyzed: score={}, sections={}, skill_gaps={}",
        analysis.score,
        analysis.sections.len(),
        analysis.skill_gaps.len()
    );
    Ok(analysis)
}
