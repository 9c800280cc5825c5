use thiserror::Error;

/// Errors that can occur when talking to the Messages API
#[derive(Error, Debug)]
pub enum ClaudeApiError {
    /// Invalid request parameters or malformed request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication failed due to invalid or missing API key
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Rate limit exceeded, retry after waiting
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// API server encountered an internal error
    #[error("API server error: {0}")]
    ServerError(String),

    /// API server is overloaded, retry later
    #[error("API server overloaded")]
    Overloaded,

    /// Network error occurred during request
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("Response parsing error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Unknown error occurred
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl ClaudeApiError {
    /// Returns true when the error is transient and should be retried.
    ///
    /// Transient: rate limiting, server overload, other server errors.
    /// Everything else fails fast.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded | Self::ServerError(_) | Self::Overloaded
        )
    }

    /// Classify an HTTP status code and response body.
    ///
    /// - 400 → invalid request
    /// - 401, 403 → authentication failed
    /// - 429 → rate limit exceeded
    /// - 529 → overloaded
    /// - other 5xx → server error
    /// - anything else → unknown
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            400 => Self::InvalidRequest(body),
            401 | 403 => Self::AuthenticationFailed(body),
            429 => Self::RateLimitExceeded,
            529 => Self::Overloaded,
            code if (500..600).contains(&code) => Self::ServerError(body),
            _ => Self::Unknown(format!("HTTP {status}: {body}")),
        }
    }
}
