//! Client error types

use medadmin_core::SessionError;
use thiserror::Error;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Required input missing; nothing was sent
    #[error("Validation failed: {0}")]
    Validation(String),

    /// No session; a login is required
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The session could not be renewed
    #[error("Session expired: {0}")]
    SessionExpired(SessionError),
}

impl ClientError {
    /// Create error from HTTP status code
    ///
    /// `body` is the raw response body; the backend's `message` field is
    /// used when the body is a JSON error document.
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        let message = extract_message(&body).unwrap_or_else(|| {
            if body.trim().is_empty() {
                status.to_string()
            } else {
                body
            }
        });

        match status.as_u16() {
            400 => Self::BadRequest(message),
            401 => Self::AuthenticationFailed(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            _ => Self::ServerError {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Whether the error ends the session
    pub const fn is_session_failure(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed(_) | Self::NotAuthenticated | Self::SessionExpired(_)
        )
    }

    /// User-facing message, preferring the backend's wording
    pub fn message(&self) -> String {
        match self {
            Self::ServerError { message, .. }
            | Self::AuthenticationFailed(message)
            | Self::NotFound(message)
            | Self::BadRequest(message)
            | Self::Forbidden(message)
            | Self::Validation(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("message")?.as_str().map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_uses_backend_message() {
        let err = ClientError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"success":false,"message":"Email already exists"}"#.to_string(),
        );
        assert!(matches!(err, ClientError::BadRequest(ref m) if m == "Email already exists"));
        assert_eq!(err.message(), "Email already exists");
    }

    #[test]
    fn test_from_status_falls_back_to_body_or_status() {
        let err = ClientError::from_status(StatusCode::BAD_GATEWAY, "upstream down".to_string());
        assert!(matches!(
            err,
            ClientError::ServerError { status: 502, ref message } if message == "upstream down"
        ));

        let err = ClientError::from_status(StatusCode::NOT_FOUND, String::new());
        assert!(matches!(err, ClientError::NotFound(ref m) if m == "404 Not Found"));
    }

    #[test]
    fn test_session_failures() {
        let unauthorized = ClientError::from_status(StatusCode::UNAUTHORIZED, String::new());
        assert!(unauthorized.is_session_failure());
        assert!(
            ClientError::SessionExpired(SessionError::RefreshTokenMissing).is_session_failure()
        );
        assert!(!ClientError::Validation("code".into()).is_session_failure());
    }
}
