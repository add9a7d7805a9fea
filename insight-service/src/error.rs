//! Request-level errors and their HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use insight_prompts::{PromptError, TaskKind};
use serde_json::json;
use thiserror::Error;

/// Result alias for request handling.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors caused by the caller's input. Provider and extraction failures are
/// not errors at this level; see [`AnalysisOutcome`](crate::AnalysisOutcome).
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request body is not valid JSON.
    #[error("Invalid JSON input")]
    InvalidJson {
        /// Parser failure.
        #[source]
        source: serde_json::Error,
    },

    /// The task needs a JSON object and received another kind of value.
    #[error("Invalid JSON input")]
    NotAnObject {
        /// Task that rejected the payload.
        task: TaskKind,
    },

    /// The payload could not be rendered into a prompt.
    #[error("failed to build prompt: {source}")]
    Prompt {
        /// Underlying prompt failure.
        #[from]
        source: PromptError,
    },
}

impl ServiceError {
    /// HTTP status reported for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
