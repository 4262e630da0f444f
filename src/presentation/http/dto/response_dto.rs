use axum::http::StatusCode;
use serde::Serialize;

use crate::domain::errors::{ErrorKind, RagError};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(code: String, message: String, details: Option<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message,
                details,
            }),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Error envelope for a core failure. Only caller-caused errors echo their
    /// message; everything else gets a fixed text so upstream details stay in
    /// the logs.
    pub fn from_rag_error(error: &RagError, details: Option<String>) -> (StatusCode, Self) {
        let status = status_for(error);
        let message = match error {
            RagError::InvalidInput(msg) | RagError::NotFound(msg) => msg.clone(),
            RagError::TransientExternal(_) => {
                "A dependency is temporarily unavailable, please retry".to_string()
            }
            _ => "Internal server error".to_string(),
        };
        let code = error.kind().to_string().to_uppercase();
        (status, Self::error(code, message, details))
    }
}

pub fn status_for(error: &RagError) -> StatusCode {
    match error.kind() {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::TransientExternal => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::PermanentExternal | ErrorKind::ParseError | ErrorKind::Storage => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponseDto {
    pub status: String,
    pub version: String,
}
