use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed set of failures produced by the retrieval and ingestion core.
///
/// Every operation documents which variants it may return. Adapters classify
/// their own transport errors into these variants at the boundary so the
/// orchestrators never inspect upstream error text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RagError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Transient external failure: {0}")]
    TransientExternal(String),
    #[error("Permanent external failure: {0}")]
    PermanentExternal(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    TransientExternal,
    PermanentExternal,
    ParseError,
    Storage,
}

impl RagError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RagError::InvalidInput(_) => ErrorKind::InvalidInput,
            RagError::NotFound(_) => ErrorKind::NotFound,
            RagError::TransientExternal(_) => ErrorKind::TransientExternal,
            RagError::PermanentExternal(_) => ErrorKind::PermanentExternal,
            RagError::Parse(_) => ErrorKind::ParseError,
            RagError::Storage(_) => ErrorKind::Storage,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, RagError::TransientExternal(_))
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        RagError::InvalidInput(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        RagError::NotFound(msg.into())
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        RagError::TransientExternal(msg.into())
    }

    pub fn permanent(msg: impl Into<String>) -> Self {
        RagError::PermanentExternal(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        RagError::Storage(msg.into())
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::NotFound => "not_found",
            ErrorKind::TransientExternal => "transient_external",
            ErrorKind::PermanentExternal => "permanent_external",
            ErrorKind::ParseError => "parse_error",
            ErrorKind::Storage => "storage",
        };
        write!(f, "{}", name)
    }
}

pub type RagResult<T> = Result<T, RagError>;
