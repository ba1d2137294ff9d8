use std::path::PathBuf;

use thiserror::Error;

use crate::curriculum::{Grade, Phase};

/// Rejections raised while validating a lesson form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("grade {grade} does not belong to phase {phase}")]
    GradeOutsidePhase { grade: Grade, phase: Phase },

    #[error("expected 1 to 6 learning outcomes, got {0}")]
    OutcomeCount(usize),

    #[error("learning outcome {0} is blank")]
    BlankOutcome(usize),
}

/// Errors from the text-generation service and its retry wrapper.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("API key not set: environment variable {0} is empty or missing")]
    MissingApiKey(String),

    #[error("API key rejected or model not accessible: {0}")]
    InvalidApiKey(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generation service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("generation service returned no text")]
    EmptyResponse,

    #[error("response is not valid JSON for the expected schema: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("failed to generate content after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

impl GenerationError {
    /// Transport, service and validation failures are worth another attempt;
    /// credential problems are not.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            GenerationError::MissingApiKey(_)
                | GenerationError::InvalidApiKey(_)
                | GenerationError::RetriesExhausted { .. }
        )
    }
}

/// Errors while serializing a document to an export format.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
