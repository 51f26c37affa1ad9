use axum::http::StatusCode;
use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("click at {attempted} precedes the last recorded click at {last}")]
    OrderingViolation {
        last: DateTime<Utc>,
        attempted: DateTime<Utc>,
    },
    #[error("failed to write csv: {0}")]
    Export(String),
}

impl From<csv::Error> for EngineError {
    fn from(err: csv::Error) -> Self {
        Self::Export(err.to_string())
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::OrderingViolation { .. } => Self::conflict(err.to_string()),
            EngineError::Export(_) => Self::internal(err),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
