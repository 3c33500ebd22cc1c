//! API errors.

use serde_json::Value;
use thiserror::Error;

const UNAUTHORIZED: u16 = 401;
const NOT_FOUND: u16 = 404;

/// Body fields checked for a server supplied message, first present wins.
const MESSAGE_FIELDS: [&str; 3] = ["error", "detail", "message"];

#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure or timeout.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("request failed with status {status}")]
    Status {
        status: u16,
        message: Option<String>,
    },

    /// The response body did not have the expected shape.
    #[error("unexpected response body")]
    Decode(#[source] serde_json::Error),
}

impl ApiError {
    /// HTTP status of a rejected request.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(error) => error.status().map(|status| status.as_u16()),
            Self::Decode(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(UNAUTHORIZED)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(NOT_FOUND)
    }

    /// The server's message when it sent one, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Status {
                message: Some(message),
                ..
            } => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// Pull a human readable message out of an error body.
pub fn extract_error_message(body: &Value) -> Option<String> {
    MESSAGE_FIELDS
        .iter()
        .find_map(|field| body.get(field).and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_error_field_wins_over_detail() {
        let body = json!({ "detail": "second", "error": "first" });

        assert_eq!(extract_error_message(&body).as_deref(), Some("first"));
    }

    #[test]
    fn test_detail_used_when_error_missing() {
        let body = json!({ "detail": "Not enough stock", "message": "third" });

        assert_eq!(
            extract_error_message(&body).as_deref(),
            Some("Not enough stock")
        );
    }

    #[test]
    fn test_non_string_fields_are_ignored() {
        let body = json!({ "error": { "code": 3 }, "message": "plain" });

        assert_eq!(extract_error_message(&body).as_deref(), Some("plain"));
        assert_eq!(extract_error_message(&json!([])), None);
    }

    #[test]
    fn test_user_message_falls_back() {
        let rejected = ApiError::Status {
            status: 400,
            message: Some("Quantity too large".to_string()),
        };
        let bare = ApiError::Status {
            status: 500,
            message: None,
        };

        assert_eq!(rejected.user_message("Failed"), "Quantity too large");
        assert_eq!(bare.user_message("Failed"), "Failed");
        assert!(!bare.is_unauthorized());
    }

    #[test]
    fn test_status_classification() {
        let unauthorized = ApiError::Status {
            status: 401,
            message: None,
        };
        let missing = ApiError::Status {
            status: 404,
            message: None,
        };

        assert!(unauthorized.is_unauthorized());
        assert!(missing.is_not_found());
        assert_eq!(missing.status(), Some(404));
    }
}
