use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PredictError>;

/// Caller-side problems with the request. Always reported as 400.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{}{field} is required", item_prefix(*index))]
    MissingField {
        field: String,
        index: Option<usize>,
    },

    #[error("{}{field} must be a number", item_prefix(*index))]
    NotNumeric {
        field: String,
        index: Option<usize>,
    },

    #[error("{0}")]
    BadShape(String),

    #[error("Invalid JSON body: {0}")]
    InvalidJson(String),
}

fn item_prefix(index: Option<usize>) -> String {
    match index {
        Some(index) => format!("Item {index}: "),
        None => String::new(),
    }
}

impl ValidationError {
    pub fn expected_list() -> Self {
        Self::BadShape("Expected a list of user data".to_string())
    }

    pub fn expected_object() -> Self {
        Self::BadShape("Expected a user data object".to_string())
    }
}

#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Raised by the classifier; the message is passed through untouched.
    #[error("{0}")]
    Prediction(String),

    #[error("{0}")]
    Internal(String),
}

impl PredictError {
    pub fn prediction(message: impl Into<String>) -> Self {
        Self::Prediction(message.into())
    }
}

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid model artifact: {0}")]
    Invalid(String),
}

impl ModelLoadError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid(reason.into())
    }
}
