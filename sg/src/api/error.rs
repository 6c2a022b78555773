//! Backend API error types

use thiserror::Error;

/// Errors that can occur while talking to the song backend
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered with `success: false`
    #[error("{0}")]
    Rejected(String),

    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// Message suitable for a user-facing notification when the backend rejected the request
    pub fn rejection(&self) -> Option<&str> {
        match self {
            ApiError::Rejected(message) => Some(message),
            _ => None,
        }
    }

    /// Transport-level failures (the request never produced a usable answer)
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Http { .. } | ApiError::Json(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_message() {
        let err = ApiError::Rejected("quota exceeded".to_string());
        assert_eq!(err.rejection(), Some("quota exceeded"));
        assert_eq!(err.to_string(), "quota exceeded");

        let err = ApiError::InvalidResponse("missing content_id".to_string());
        assert_eq!(err.rejection(), None);
    }

    #[test]
    fn test_is_transport() {
        assert!(
            ApiError::Http {
                status: 502,
                message: "Bad gateway".to_string()
            }
            .is_transport()
        );
        assert!(!ApiError::Rejected("nope".to_string()).is_transport());
        assert!(!ApiError::InvalidResponse("bad".to_string()).is_transport());
    }
}
