use crate::models::GenerationMode;
use crate::resolver::ValidationIssue;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("{0}")]
    Validation(ValidationIssue),

    /// Message reported by the generation backend, surfaced as-is.
    #[error("{0}")]
    Backend(String),

    #[error("Video generation currently requires a start image.")]
    ContractViolation,

    #[error("A generation is already in progress")]
    AlreadyInFlight,

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Model {model_id} does not support {mode} generation")]
    ModelModeMismatch {
        model_id: String,
        mode: GenerationMode,
    },

    #[error("Invalid {field} '{value}' for the selected model")]
    InvalidOption { field: &'static str, value: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ValidationIssue> for StudioError {
    fn from(issue: ValidationIssue) -> Self {
        StudioError::Validation(issue)
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;
