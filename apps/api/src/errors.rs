use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Usage limit reached")]
    UsageLimit,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    /// The model answered but its output did not match the expected analysis shape.
    #[error("Failed to parse analysis results: {0}")]
    AnalysisParse(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<LlmError> for AppError {
    fn from(error: LlmError) -> Self {
        match error {
            LlmError::RateLimited { .. } => AppError::RateLimited,
            LlmError::UsageLimit => AppError::UsageLimit,
            other => AppError::Llm(other.to_string()),
        }
    }
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::UnprocessableEntity(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "UNPROCESSABLE_ENTITY")
            }
            AppError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            AppError::UsageLimit => (StatusCode::PAYMENT_REQUIRED, "USAGE_LIMIT"),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            AppError::Llm(_) | AppError::AnalysisParse(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "LLM_ERROR")
            }
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Message safe to show the client. Server-side failures are logged here and replaced
    /// with a generic message.
    fn client_message(&self) -> String {
        match self {
            AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::UnprocessableEntity(msg) => msg.clone(),
            AppError::RateLimited => "Rate limit exceeded. Please try again in a moment.".to_string(),
            AppError::UsageLimit => "Usage limit reached. Please add credits to continue.".to_string(),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                "A database error occurred".to_string()
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                "An AI processing error occurred".to_string()
            }
            AppError::AnalysisParse(detail) => {
                tracing::error!("Analysis parse error: {detail}");
                "Failed to parse analysis results".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.client_message()
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_rate_limit_maps_to_429() {
        let err: AppError = LlmError::RateLimited { retries: 2 }.into();
        assert_eq!(err.into_response().status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_llm_usage_limit_maps_to_402() {
        let err: AppError = LlmError::UsageLimit.into();
        assert_eq!(err.into_response().status(), StatusCode::PAYMENT_REQUIRED);
    }

    #[test]
    fn test_other_llm_errors_are_500() {
        let err: AppError = LlmError::EmptyContent.into();
        assert!(matches!(err, AppError::Llm(_)));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_llm_detail_is_not_leaked() {
        let err = AppError::Llm("upstream said: secret stack trace".to_string());
        assert_eq!(err.client_message(), "An AI processing error occurred");

        let err = AppError::AnalysisParse("missing field `score`".to_string());
        assert_eq!(err.client_message(), "Failed to parse analysis results");
    }

    #[test]
    fn test_not_found_keeps_message() {
        let err = AppError::NotFound("Roadmap 1 not found".to_string());
        assert_eq!(err.status_and_code(), (StatusCode::NOT_FOUND, "NOT_FOUND"));
        assert_eq!(err.client_message(), "Roadmap 1 not found");
    }

    #[test]
    fn test_validation_is_400() {
        let err = AppError::Validation("bad".to_string());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
