//! Raw fetched payloads with provenance.

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// A byte payload as fetched from a remote endpoint, before decoding.
///
/// Owned by the orchestrator until handed to the decoder, which consumes it.
#[derive(Debug, Clone)]
pub struct RawMessage {
    /// The undecoded payload.
    pub payload: Bytes,
    /// URL of the endpoint the payload was fetched from.
    pub source: String,
    /// When the fetch completed.
    pub fetched_at: DateTime<Utc>,
}

impl RawMessage {
    pub fn new(payload: Bytes, source: impl Into<String>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            payload,
            source: source.into(),
            fetched_at,
        }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
