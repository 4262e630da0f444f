use crate::domain::errors::RagError;

/// Failure of a remote model call (embeddings, chat, cross-encoder).
#[derive(Debug)]
pub enum ModelProviderError {
    NetworkError(String),
    Timeout(String),
    RateLimitExceeded,
    ServiceUnavailable(String),
    ApiError { status: u16, message: String },
    InvalidResponse(String),
    InvalidInput(String),
}

impl ModelProviderError {
    /// Classifies an HTTP status returned by a model API.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            429 => ModelProviderError::RateLimitExceeded,
            500..=599 => ModelProviderError::ServiceUnavailable(format!("{}: {}", status, message)),
            _ => ModelProviderError::ApiError { status, message },
        }
    }

    pub fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ModelProviderError::Timeout(error.without_url().to_string())
        } else if error.is_decode() {
            ModelProviderError::InvalidResponse(error.without_url().to_string())
        } else {
            ModelProviderError::NetworkError(error.without_url().to_string())
        }
    }
}

impl std::fmt::Display for ModelProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelProviderError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            ModelProviderError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            ModelProviderError::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            ModelProviderError::ServiceUnavailable(msg) => {
                write!(f, "Service unavailable: {}", msg)
            }
            ModelProviderError::ApiError { status, message } => {
                write!(f, "API error ({}): {}", status, message)
            }
            ModelProviderError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            ModelProviderError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for ModelProviderError {}

impl From<ModelProviderError> for RagError {
    fn from(error: ModelProviderError) -> Self {
        match error {
            ModelProviderError::NetworkError(_)
            | ModelProviderError::Timeout(_)
            | ModelProviderError::RateLimitExceeded
            | ModelProviderError::ServiceUnavailable(_) => {
                RagError::TransientExternal(error.to_string())
            }
            ModelProviderError::ApiError { .. } | ModelProviderError::InvalidResponse(_) => {
                RagError::PermanentExternal(error.to_string())
            }
            ModelProviderError::InvalidInput(msg) => RagError::InvalidInput(msg),
        }
    }
}
