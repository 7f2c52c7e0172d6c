// Errors returned by calls to the note service. Non-2xx statuses are
// mapped to variants; the service's own error message is kept when present.

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized - access token may be revoked: {0}")]
    Unauthorized(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No access token; authorize first")]
    MissingCredentials,

    #[error("Failed to sign request: {0}")]
    Signing(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error payload the note service returns alongside non-2xx statuses.
#[derive(Deserialize)]
struct ServiceError {
    error: Option<serde_json::Value>,
    message: Option<String>,
}

impl ApiError {
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// Prefer the service's `error`/`message` fields over the raw body.
    fn describe_body(body: &str) -> String {
        match serde_json::from_str::<ServiceError>(body) {
            Ok(ServiceError {
                error: Some(code),
                message: Some(message),
            }) => {
                let code = match code {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                format!("{} (error {})", message, code)
            }
            Ok(ServiceError {
                error: None,
                message: Some(message),
            }) => message,
            _ => Self::truncate_body(body),
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let detail = Self::describe_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized(detail),
            403 => ApiError::AccessDenied(detail),
            404 => ApiError::NotFound(detail),
            500..=599 => ApiError::ServerError(detail),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, detail)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, "gone"),
            ApiError::NotFound(ref s) if s == "gone"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, ""),
            ApiError::ServerError(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_REQUEST, ""),
            ApiError::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_service_message_is_used() {
        let body = r#"{"error":"1013","message":"notebook already exists"}"#;
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, body);
        assert_eq!(
            err.to_string(),
            "Server error: notebook already exists (error 1013)"
        );
    }

    #[test]
    fn test_long_body_truncated() {
        let body = "x".repeat(MAX_ERROR_BODY_LENGTH + 10);
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body);
        assert!(err.to_string().contains("truncated, 510 total bytes"));
    }
}
