//! Error taxonomy shared by every coordinator.
//!
//! Validation errors are raised before a request is dispatched. Transport and
//! backend errors come back from the gateway and are shown to the user as-is.

use thiserror::Error;

/// Missing or malformed user input. Nothing is sent to the backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please upload a valid CSV file ('{file}' is not CSV)")]
    InvalidFileKind { file: String },

    #[error("Please select at least {required} files (got {supplied})")]
    InsufficientFiles { required: usize, supplied: usize },

    #[error("Please provide both your Kaggle username and API key")]
    InvalidCredentials,

    #[error("Dataset path should be in format: username/dataset-name (got '{0}')")]
    InvalidDatasetPath(String),

    #[error("Incomplete selection: {0}")]
    IncompleteSelection(String),

    #[error("Please compile a model before requesting recommendations")]
    ModelNotCompiled,

    #[error("Please enter a value to get recommendations")]
    EmptyQuery,

    #[error("Please enter a value for '{0}'")]
    MissingQueryValue(String),

    #[error("Invalid model configuration: {0}")]
    InvalidConfiguration(String),
}

/// Top-level error surfaced by coordinator operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Network failure or non-2xx status.
    #[error("Request failed: {0}")]
    Transport(String),

    /// 2xx response carrying `success: false`.
    #[error("{0}")]
    Backend(String),

    /// The browser refused to persist local state.
    #[error("Could not save the session, it will not survive a reload: {0}")]
    Storage(String),

    /// A DOM call failed (file read, download).
    #[error("Browser error: {0}")]
    Browser(String),
}

impl AppError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    pub fn browser(message: impl Into<String>) -> Self {
        Self::Browser(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Transport(format!("malformed response: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_convert_and_keep_their_message() {
        let err: AppError = ValidationError::InsufficientFiles {
            required: 2,
            supplied: 1,
        }
        .into();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Please select at least 2 files (got 1)");
    }

    #[test]
    fn backend_errors_are_shown_verbatim() {
        let err = AppError::backend("Column 'label' not found");
        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "Column 'label' not found");
    }

    #[test]
    fn json_errors_become_transport_errors() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: AppError = parse.unwrap_err().into();
        assert!(matches!(err, AppError::Transport(ref m) if m.starts_with("malformed response")));
    }

    #[test]
    fn browser_and_storage_failures_are_not_validation() {
        let download = AppError::browser("could not create the download blob");
        assert!(!download.is_validation());
        assert_eq!(download.to_string(), "Browser error: could not create the download blob");

        let storage = AppError::storage("quota exceeded");
        assert!(storage.to_string().ends_with("quota exceeded"));
    }
}
