//! Transport error taxonomy.
//!
//! Per-endpoint failures are absorbed and recorded while the fetch walks
//! the endpoint list; only full exhaustion surfaces to the caller, carrying
//! every recorded reason.

use thiserror::Error;

/// Why a single endpoint attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("empty response body")]
    EmptyBody,

    #[error("truncated body: expected {expected} bytes, got {actual}")]
    Truncated { expected: u64, actual: u64 },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("no files matching '{0}' in listing")]
    NoMatchingFiles(String),
}

/// A recorded per-endpoint failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointFailure {
    pub endpoint: String,
    pub reason: FetchFailure,
}

impl std::fmt::Display for EndpointFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.endpoint, self.reason)
    }
}

/// Errors surfaced by the transport layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Every endpoint in the list failed; the attempts carry each reason.
    #[error("All endpoints exhausted: {}", summarize(.attempts))]
    AllEndpointsExhausted { attempts: Vec<EndpointFailure> },

    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

fn summarize(attempts: &[EndpointFailure]) -> String {
    attempts
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhaustion_message_lists_every_reason() {
        let err = TransportError::AllEndpointsExhausted {
            attempts: vec![
                EndpointFailure {
                    endpoint: "http://a.example".to_string(),
                    reason: FetchFailure::Status(404),
                },
                EndpointFailure {
                    endpoint: "ftp://b.example".to_string(),
                    reason: FetchFailure::Timeout,
                },
            ],
        };

        let message = err.to_string();
        assert!(message.contains("http://a.example: unexpected status 404"));
        assert!(message.contains("ftp://b.example: request timed out"));
    }
}
