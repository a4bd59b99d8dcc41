use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - token missing, invalid or expired")]
    Unauthorized,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Request rejected: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to encode request body: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Credential storage error: {0}")]
    Storage(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            422 => ApiError::Validation(truncated),
            429 => ApiError::RateLimited,
            400..=499 => ApiError::BadRequest(truncated),
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    /// Whether a read that failed this way is worth repeating
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            ApiError::Unauthorized
                | ApiError::AccessDenied(_)
                | ApiError::NotFound(_)
                | ApiError::Validation(_)
                | ApiError::BadRequest(_)
                | ApiError::Serialization(_)
        )
    }

    /// Short message suitable for a status line
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized => "Session expired. Please log in again.".to_string(),
            ApiError::RateLimited => "Server is busy. Please wait a moment and try again.".to_string(),
            ApiError::Network(e) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            ApiError::Network(_) => "Unable to connect to server. Check your connection.".to_string(),
            ApiError::BadRequest(body) | ApiError::Validation(body) => {
                server_detail(body).unwrap_or_else(|| "The server rejected the request.".to_string())
            }
            ApiError::AccessDenied(body) | ApiError::NotFound(body) => {
                server_detail(body).unwrap_or_else(|| format!("Error: {}", self))
            }
            other => format!("Error: {}", other),
        }
    }
}

/// The `detail` field of a rejection body: either a message, or a list of
/// field errors each carrying a `msg`
fn server_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_mapping() {
        assert!(ApiError::from_status(StatusCode::UNAUTHORIZED, "").is_unauthorized());
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, "no such book"),
            ApiError::NotFound(ref b) if b == "no such book"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::UNPROCESSABLE_ENTITY, "bad"),
            ApiError::Validation(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, "oops"),
            ApiError::ServerError(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_REQUEST, "taken"),
            ApiError::BadRequest(ref b) if b == "taken"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::IM_A_TEAPOT, ""),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_MODIFIED, ""),
            ApiError::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "x".repeat(2000);
        match ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body) {
            ApiError::ServerError(msg) => {
                assert!(msg.len() < 600);
                assert!(msg.contains("2000 total bytes"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_retryable() {
        assert!(!ApiError::Unauthorized.is_retryable());
        assert!(!ApiError::NotFound(String::new()).is_retryable());
        assert!(ApiError::ServerError(String::new()).is_retryable());
        assert!(ApiError::RateLimited.is_retryable());
        assert!(!ApiError::from_status(StatusCode::BAD_REQUEST, "").is_retryable());
    }

    #[test]
    fn test_user_message_shows_server_detail() {
        let taken = ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"detail": "Email already registered"}"#);
        assert_eq!(taken.user_message(), "Email already registered");

        let fields = ApiError::from_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail": [{"loc": ["body", "email"], "msg": "value is not a valid email address"}]}"#,
        );
        assert_eq!(fields.user_message(), "value is not a valid email address");

        let bare = ApiError::from_status(StatusCode::BAD_REQUEST, "<html>nope</html>");
        assert_eq!(bare.user_message(), "The server rejected the request.");
    }
}
