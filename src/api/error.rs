use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("No query results for model [{model}] {}", values.join(", "))]
    NotFound {
        model: &'static str,
        values: Vec<String>,
    },

    #[error("{0}")]
    InvalidArgument(String),

    #[error("API error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        AppError::InvalidArgument(message.into())
    }

    /// True when the backend answered 404
    pub fn is_not_found(&self) -> bool {
        match self {
            AppError::NotFound { .. } => true,
            AppError::Api { status, .. } => *status == StatusCode::NOT_FOUND,
            _ => false,
        }
    }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
