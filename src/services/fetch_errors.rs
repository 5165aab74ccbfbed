//! Fetch error classification
//!
//! Turns transport and API failures into structured errors so the failover
//! loop can log them uniformly and the collector can surface one message per
//! account.

use serde::Deserialize;
use thiserror::Error;

/// Structured errors for a single API request
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Connection, DNS or proxy handshake failure
    #[error("network error: {0}")]
    Network(String),

    /// The request did not finish within the configured timeout
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The body was not the expected JSON envelope
    #[error("invalid response: {0}")]
    Decode(String),

    /// A proxy line could not be parsed or turned into a client
    #[error("invalid proxy: {0}")]
    InvalidProxy(String),

    /// The bearer token cannot be sent as a header value
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Every proxy in the list was tried and failed
    #[error("all {attempts} proxies exhausted (last error: {last_error})")]
    ProxiesExhausted { attempts: usize, last_error: String },
}

/// Error body shape returned by the API on failures
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl FetchError {
    /// Build a status error, pulling the message out of a JSON body when present
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ApiErrorResponse>(body)
            .ok()
            .and_then(|parsed| parsed.msg.or(parsed.message))
            .unwrap_or_else(|| body.trim().to_string());

        FetchError::Status {
            status,
            body: truncate(&message, 120),
        }
    }

    /// Classify a reqwest error
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Network("connection failed".to_string())
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_with_json_message() {
        let err = FetchError::from_response(401, r#"{"code":401,"msg":"token expired"}"#);
        match err {
            FetchError::Status { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "token expired");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_status_with_plain_body() {
        let err = FetchError::from_response(502, "  Bad Gateway\n");
        assert_eq!(err.to_string(), "HTTP 502: Bad Gateway");
    }

    #[test]
    fn test_long_body_is_truncated() {
        let body = "x".repeat(500);
        let err = FetchError::from_response(500, &body);
        let FetchError::Status { body, .. } = err else {
            panic!("expected status error");
        };
        assert_eq!(body.len(), 123);
        assert!(body.ends_with("..."));
    }

    #[test]
    fn test_exhausted_message() {
        let err = FetchError::ProxiesExhausted {
            attempts: 3,
            last_error: "request timed out".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "all 3 proxies exhausted (last error: request timed out)"
        );
    }
}
