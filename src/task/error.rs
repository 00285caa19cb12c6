//! Error taxonomy for task operations.
//!
//! The core raises typed errors; the API layer maps them to responses.
//! Authorization failures carry enough detail to name the violated rule.

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not permitted: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

pub type TaskResult<T> = Result<T, TaskError>;

impl TaskError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Authorization(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    pub fn into_response(self) -> (StatusCode, String) {
        (self.status_code(), self.to_string())
    }
}
