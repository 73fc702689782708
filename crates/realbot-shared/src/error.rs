//! Error types for REALbot.

use thiserror::Error;

/// Failures of the JSON document storage (knowledge base, analytics).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum RealbotError {
    #[error("Session not found")]
    SessionNotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),

    #[error("Invalid knowledge base format: {0}")]
    Validation(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl RealbotError {
    /// HTTP status the daemon answers with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            RealbotError::SessionNotFound(_) => 404,
            RealbotError::Validation(_) => 400,
            RealbotError::InvalidRequest(_) => 400,
            RealbotError::Persistence(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(RealbotError::SessionNotFound("abc".into()).status_code(), 404);
        assert_eq!(RealbotError::Validation("not an array".into()).status_code(), 400);
        assert_eq!(
            RealbotError::Persistence(StoreError::Unavailable("disk".into())).status_code(),
            500
        );
    }

    #[test]
    fn test_invalid_request_is_400() {
        let err = RealbotError::InvalidRequest("missing field `message`".into());
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "Invalid request: missing field `message`");
    }

    #[test]
    fn test_session_not_found_message() {
        // Matches the original wire error body
        let err = RealbotError::SessionNotFound("abc".into());
        assert_eq!(err.to_string(), "Session not found");
    }
}
