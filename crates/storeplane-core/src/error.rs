//! Error types for the dashboard client.

use thiserror::Error;

/// Failure talking to the provisioning backend.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Request could not be built or sent, or the body could not be read
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("HTTP error: {0}")]
    HttpStatus(reqwest::StatusCode),

    /// Response body was not the expected JSON shape
    #[error("Failed to parse response body: {0}")]
    Parse(#[from] serde_json::Error),

    /// Configured base address is not a usable URL
    #[error("Invalid API base address: {0}")]
    InvalidBaseUrl(String),
}

impl FetchError {
    /// Whether the backend received the request and answered it.
    ///
    /// A create or delete that came back with an error status was still
    /// seen by the backend, so the follow-up refresh is worth issuing.
    /// Transport failures never reached it. A body that broke off after
    /// the status line still means the backend answered.
    pub fn is_acknowledged(&self) -> bool {
        match self {
            FetchError::HttpStatus(_) | FetchError::Parse(_) => true,
            FetchError::Request(e) => e.status().is_some() || e.is_body() || e.is_decode(),
            FetchError::InvalidBaseUrl(_) => false,
        }
    }
}

/// Errors raised while validating a dashboard configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("api_base is not a valid http(s) URL: {0}")]
    ApiBase(String),

    #[error("api_base must not carry a query or fragment: {0}")]
    ApiBaseQuery(String),

    #[error("post_create.poll_interval_secs must be > 0")]
    PollInterval,

    #[error("post_create.poll_max_attempts must be > 0")]
    PollAttempts,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_count_as_acknowledged() {
        let err = FetchError::HttpStatus(reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_acknowledged());
        assert_eq!(err.to_string(), "HTTP error: 500 Internal Server Error");
    }

    #[test]
    fn bad_base_url_is_not_acknowledged() {
        let err = FetchError::InvalidBaseUrl("nope".to_string());
        assert!(!err.is_acknowledged());
    }

    #[test]
    fn parse_errors_count_as_acknowledged() {
        let err: FetchError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(err.is_acknowledged());
    }
}
