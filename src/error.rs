use std::time::Duration;
use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage Error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("Memory Error: {0}")]
    Memory(#[from] MemoryError),
    #[error("Pipeline Error: {0}")]
    Pipeline(String),
}

/// Terminal error recorded on a workflow run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkflowError {
    #[error("Invalid input: {0}")]
    InputValidation(String),
    #[error("Detection failed: {0}")]
    DetectionFailure(#[from] DetectionError),
    #[error("Memory unavailable: {0}")]
    MemoryUnavailable(#[from] MemoryError),
    #[error("Emission failed: {0}")]
    EmissionFailure(#[from] EmissionError),
    #[error("Run cancelled before reporting")]
    Cancelled,
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InputValidation,
    DetectionFailure,
    MemoryUnavailable,
    EmissionFailure,
    Cancelled,
    Internal,
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::InputValidation(_) => ErrorKind::InputValidation,
            WorkflowError::DetectionFailure(_) => ErrorKind::DetectionFailure,
            WorkflowError::MemoryUnavailable(_) => ErrorKind::MemoryUnavailable,
            WorkflowError::EmissionFailure(_) => ErrorKind::EmissionFailure,
            WorkflowError::Cancelled => ErrorKind::Cancelled,
            WorkflowError::Internal(_) => ErrorKind::Internal,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    #[error("detector timed out after {0:?}")]
    Timeout(Duration),
    #[error("unreadable input: {0}")]
    Unreadable(String),
    #[error("detector backend error: {0}")]
    Backend(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MemoryError {
    #[error("memory backend unreachable: {0}")]
    Unavailable(String),
    #[error("memory backend timed out after {0:?}")]
    Timeout(Duration),
    #[error("corrupt memory record: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for MemoryError {
    fn from(err: rusqlite::Error) -> Self {
        MemoryError::Unavailable(err.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmissionError {
    #[error("failed to render report: {0}")]
    Render(String),
    #[error("emitter timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("text generation failed: {0}")]
    Failed(String),
    #[error("text generation timed out after {0:?}")]
    Timeout(Duration),
}
