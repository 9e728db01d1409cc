//! Error types for the question bank.
//!
//! `DecodeError` is fatal for a whole ingestion run, `StoreError` comes from
//! `QuestionStore` implementations, and `QbankError` is what the
//! `QuestionBank` service hands back to its callers.

use thiserror::Error;
use uuid::Uuid;

/// A tabular file could not be decoded. Nothing is persisted when this occurs.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The CSV stream was malformed or not valid UTF-8.
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The XLSX workbook could not be opened or read.
    #[error("malformed XLSX: {0}")]
    Xlsx(#[from] calamine::XlsxError),

    /// The workbook has no worksheet to read.
    #[error("workbook contains no worksheets")]
    NoWorksheet,

    /// The file has no header row.
    #[error("file has no header row")]
    MissingHeader,
}

/// Errors raised by a `QuestionStore` backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another topic in the same module already uses this name (case-insensitive).
    #[error("topic name '{name}' already exists in module {module_id}")]
    DuplicateName { module_id: String, name: String },

    /// The referenced entity does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: Uuid },

    /// Reading or writing the backing file failed.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted snapshot could not be (de)serialized.
    #[error("store serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Any other backend failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Errors returned by the `QuestionBank` service.
#[derive(Debug, Error)]
pub enum QbankError {
    #[error("failed to decode upload: {0}")]
    Decode(#[from] DecodeError),

    #[error("topic name '{name}' already exists in module {module_id}")]
    DuplicateName { module_id: String, name: String },

    #[error("insufficient questions: {available} available, {requested} requested")]
    InsufficientQuestions { available: usize, requested: usize },

    #[error("unknown module: {0}")]
    UnknownModule(String),

    #[error("topic not found: {0}")]
    TopicNotFound(Uuid),

    #[error("topic {topic_id} does not belong to module {module_id}")]
    TopicModuleMismatch { topic_id: Uuid, module_id: String },

    #[error("question not found: {0}")]
    QuestionNotFound(Uuid),

    #[error("invalid question: {0}")]
    InvalidQuestion(String),

    #[error("duplicate question: {0}")]
    DuplicateQuestion(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for QbankError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateName { module_id, name } => {
                QbankError::DuplicateName { module_id, name }
            }
            other => QbankError::Store(other),
        }
    }
}

impl QbankError {
    /// Returns `true` if the request was rejected before anything was mutated
    /// and the caller can fix it (as opposed to a decode or backend failure).
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            QbankError::DuplicateName { .. }
                | QbankError::InsufficientQuestions { .. }
                | QbankError::UnknownModule(_)
                | QbankError::TopicNotFound(_)
                | QbankError::TopicModuleMismatch { .. }
                | QbankError::QuestionNotFound(_)
                | QbankError::InvalidQuestion(_)
                | QbankError::DuplicateQuestion(_)
                | QbankError::InvalidRequest(_)
        )
    }
}
