use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::info;

use crate::errors::AppError;
use crate::resume::analysis::{analyze_resume, extract_pdf_text, ResumeAnalysis};
use crate::state::AppState;

/// Upper bound for an uploaded resume, enforced by the router's body limit.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const PDF_MAGIC: &[u8] = b"%PDF";

/// POST /api/v1/resume/analyze
///
/// Multipart fields: `file` (PDF, required) and `target_role` (optional).
pub async fn handle_analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ResumeAnalysis>, AppError> {
    let mut pdf: Option<Vec<u8>> = None;
    let mut target_role: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read multipart field: {e}")))?
    {
        let field_name = field.name().unwrap_or("unknown").to_string();

        match field_name.as_str() {
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
                pdf = Some(bytes.to_vec());
            }
            "target_role" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid target_role: {e}")))?;
                target_role = Some(text);
            }
            _ => {}
        }
    }

    let pdf = pdf.ok_or_else(|| AppError::Validation("file is required".to_string()))?;
    if !pdf.starts_with(PDF_MAGIC) {
        return Err(AppError::Validation("file must be a PDF".to_string()));
    }

    info!("Analyzing resume upload ({} bytes)", pdf.len());
    let text = extract_pdf_text(pdf).await?;
    let analysis = analyze_resume(&text, target_role.as_deref(), &state.llm).await?;
    Ok(Json(analysis))
}
