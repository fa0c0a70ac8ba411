//! Error types for the pool service client
//!
//! Failed responses carry a JSON body with a service error code
//! (`{"code": "JobNotFound", "message": {"value": "..."}}`). The code is kept
//! so callers can tell a missing resource from throttling or a rejected
//! request without matching on message text.

use thiserror::Error;
use tranche_core::domain::task::ServiceError;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the pool service client
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never got a response
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The service does not know the addressed resource (404)
    #[error("Not found: {detail}")]
    NotFound { code: Option<String>, detail: String },

    /// The service answered with any other error status
    #[error("Service error (status {status}): {detail}")]
    ApiError {
        status: u16,
        /// Service error code, when the body carried one
        code: Option<String>,
        detail: String,
    },

    /// A success response whose body did not match the expected shape
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Rejected locally before anything was sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Builds the error for a failed response from its status and body
    pub fn from_response(status: u16, body: &str) -> Self {
        let (code, detail) = match serde_json::from_str::<ServiceError>(body) {
            Ok(service) => (Some(service.code.clone()), service.to_string()),
            Err(_) if body.trim().is_empty() => (None, "no error details".to_string()),
            Err(_) => (None, body.trim().to_string()),
        };

        if status == 404 {
            Self::NotFound { code, detail }
        } else {
            Self::ApiError {
                status,
                code,
                detail,
            }
        }
    }

    /// HTTP status of the failed response, if there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::ApiError { status, .. } => Some(*status),
            Self::RequestFailed(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Service error code, e.g. `PoolExists`
    pub fn service_code(&self) -> Option<&str> {
        match self {
            Self::NotFound { code, .. } | Self::ApiError { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether sending the same request again may succeed
    ///
    /// Throttling (429), server errors and connection-level failures are
    /// transient. Everything else fails the same way again.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed(e) => e.is_timeout() || e.is_connect(),
            Self::ApiError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_body_is_parsed() {
        let body = r#"{"code":"JobNotFound","message":{"lang":"en-US","value":"The specified job does not exist."}}"#;
        let err = ClientError::from_response(404, body);

        assert!(err.is_not_found());
        assert!(!err.is_transient());
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.service_code(), Some("JobNotFound"));
        assert_eq!(
            err.to_string(),
            "Not found: JobNotFound: The specified job does not exist."
        );
    }

    #[test]
    fn test_plain_body_is_kept() {
        let err = ClientError::from_response(409, "PoolExists\n");
        assert_eq!(err.to_string(), "Service error (status 409): PoolExists");
        assert_eq!(err.service_code(), None);
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_transient_statuses() {
        assert!(ClientError::from_response(429, "").is_transient());
        assert!(ClientError::from_response(503, "").is_transient());
        assert!(!ClientError::from_response(400, "").is_transient());
        assert!(!ClientError::InvalidRequest("too many".to_string()).is_transient());
    }

    #[test]
    fn test_empty_body() {
        let err = ClientError::from_response(500, "  ");
        assert_eq!(err.to_string(), "Service error (status 500): no error details");
    }
}
