use crate::domain::errors::RagError;

#[derive(Debug)]
pub enum RepositoryError {
    NotFound(String),
    DatabaseError(String),
    ValidationError(String),
}

impl std::fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositoryError::NotFound(what) => write!(f, "Not found: {}", what),
            RepositoryError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            RepositoryError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for RepositoryError {}

impl From<RepositoryError> for RagError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound(what) => RagError::NotFound(what),
            RepositoryError::DatabaseError(msg) => RagError::Storage(msg),
            RepositoryError::ValidationError(msg) => RagError::Storage(msg),
        }
    }
}
