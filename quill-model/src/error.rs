//! Error types for the chat-completions client.

use thiserror::Error;

/// Errors raised while talking to the hosted model API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No API key was configured.
    #[error("API key is required")]
    MissingApiKey,

    /// The configured base URL does not parse.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// Authentication failed (401/403).
    #[error("[{status}] authentication failed")]
    Auth { status: u16 },

    /// Rate limit exceeded (429).
    #[error("[429] rate limit exceeded")]
    RateLimit,

    /// The server rejected the request body (400).
    #[error("[400] request validation failed{}", detail(.body))]
    Validation { body: Option<String> },

    /// A 5xx from the server.
    #[error("[{status}] server error")]
    Server { status: u16 },

    /// Any other unexpected status code.
    #[error("[{status}] unexpected status{}", detail(.body))]
    Unexpected { status: u16, body: Option<String> },

    /// The request timed out.
    #[error("request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Failed to reach the API at all.
    #[error("failed to connect to API: {0}")]
    Connection(String),

    /// The SSE stream broke mid-response.
    #[error("stream processing error: {0}")]
    Stream(String),

    /// The response body did not deserialize.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

fn detail(body: &Option<String>) -> String {
    match body {
        Some(body) if !body.is_empty() => format!(": {body}"),
        _ => String::new(),
    }
}

impl ApiError {
    /// Map a non-success HTTP status to the matching error.
    pub fn from_status(status: u16, body: Option<String>) -> Self {
        match status {
            401 | 403 => ApiError::Auth { status },
            429 => ApiError::RateLimit,
            400 => ApiError::Validation { body },
            500..=599 => ApiError::Server { status },
            _ => ApiError::Unexpected { status, body },
        }
    }

    /// Whether a retry with backoff is worthwhile.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::RateLimit | ApiError::Server { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_statuses_to_variants() {
        assert!(matches!(ApiError::from_status(401, None), ApiError::Auth { status: 401 }));
        assert!(matches!(ApiError::from_status(403, None), ApiError::Auth { status: 403 }));
        assert!(matches!(ApiError::from_status(429, None), ApiError::RateLimit));
        assert!(matches!(ApiError::from_status(400, None), ApiError::Validation { .. }));
        assert!(matches!(ApiError::from_status(503, None), ApiError::Server { status: 503 }));
        assert!(matches!(ApiError::from_status(418, None), ApiError::Unexpected { .. }));
    }

    #[test]
    fn only_rate_limit_and_server_errors_retry() {
        assert!(ApiError::RateLimit.is_retryable());
        assert!(ApiError::Server { status: 502 }.is_retryable());
        assert!(!ApiError::Auth { status: 401 }.is_retryable());
        assert!(!ApiError::Validation { body: None }.is_retryable());
        assert!(!ApiError::Timeout { seconds: 120 }.is_retryable());
    }

    #[test]
    fn display_includes_status_codes() {
        assert_eq!(ApiError::Auth { status: 401 }.to_string(), "[401] authentication failed");
        assert_eq!(ApiError::RateLimit.to_string(), "[429] rate limit exceeded");
        assert_eq!(ApiError::Server { status: 500 }.to_string(), "[500] server error");
    }
}
