use thiserror::Error;

/// Type alias for Result with ReportError
pub type Result<T> = std::result::Result<T, ReportError>;

/// Longest slice of a response body kept in an error message
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Error types for the mail keyword report job
///
/// The job has a single severity: every variant aborts the run.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Token acquisition failed or credentials are missing
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Mail API answered with a non-success status
    #[error("Mail API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Network-related error (connection refused, timeouts, TLS, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// Response body could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Spreadsheet read/write failure
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ReportError {
    /// Build an API error from a status code and a raw response body
    pub fn api(status: u16, body: &str) -> Self {
        ReportError::Api {
            status,
            message: truncate_body(body),
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ReportError::Auth(_))
    }

    pub fn is_config(&self) -> bool {
        matches!(self, ReportError::Config(_))
    }
}

fn truncate_body(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        body.to_string()
    } else {
        let head: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{}...", head)
    }
}

impl From<reqwest::Error> for ReportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            return ReportError::InvalidResponse(error.to_string());
        }
        if let Some(status) = error.status() {
            return ReportError::Api {
                status: status.as_u16(),
                message: error.to_string(),
            };
        }
        ReportError::Network(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ReportError::Api {
            status: 403,
            message: "Access denied".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("HTTP 403"));
        assert!(display.contains("Access denied"));

        let auth_error = ReportError::Auth("invalid_client".to_string());
        assert!(auth_error.to_string().contains("Authentication failed"));
    }

    #[test]
    fn test_api_error_truncates_long_body() {
        let body = "x".repeat(1000);
        match ReportError::api(500, &body) {
            ReportError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message.chars().count(), MAX_ERROR_BODY_CHARS + 3);
                assert!(message.ends_with("..."));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_api_error_keeps_short_body() {
        match ReportError::api(404, "  {\"error\":\"not found\"}\n") {
            ReportError::Api { message, .. } => assert_eq!(message, "{\"error\":\"not found\"}"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_error_kind_helpers() {
        assert!(ReportError::Auth("x".into()).is_auth());
        assert!(!ReportError::Auth("x".into()).is_config());
        assert!(ReportError::Config("x".into()).is_config());
        assert!(!ReportError::Network("x".into()).is_auth());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error: ReportError = io.into();
        assert!(matches!(error, ReportError::Io(_)));
        assert!(error.to_string().contains("denied"));
    }
}
