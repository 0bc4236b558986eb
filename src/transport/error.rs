//! Transport error definitions.

use std::fmt;
use thiserror::Error;

use crate::connection::{ConnectionError, Host};
use crate::serializer::SerializerError;

/// One failed attempt of a logical request.
#[derive(Debug)]
pub struct AttemptFailure {
    pub host: Host,
    pub error: ConnectionError,
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.host, self.error)
    }
}

fn describe(attempts: &[AttemptFailure]) -> String {
    if attempts.is_empty() {
        return "none".to_string();
    }
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Terminal failure of `perform_request`.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be turned into a valid target.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Every known connection is dead and none is past its revive window.
    #[error("no alive connections available ({known} known); attempts: {}", describe(.attempts))]
    NoConnectionsAvailable {
        known: usize,
        attempts: Vec<AttemptFailure>,
    },

    /// The retry budget ran out.
    #[error("request failed after {} attempts: {}", .attempts.len(), describe(.attempts))]
    RetriesExhausted { attempts: Vec<AttemptFailure> },

    /// A node answered with a body over `max_response_bytes`. Not retried.
    #[error("response from {host} exceeds {limit} bytes")]
    ResponseTooLarge { host: Host, limit: usize },

    #[error(transparent)]
    Serialization(#[from] SerializerError),
}

impl TransportError {
    /// Attempts made before the failure, in order.
    pub fn attempts(&self) -> &[AttemptFailure] {
        match self {
            TransportError::NoConnectionsAvailable { attempts, .. }
            | TransportError::RetriesExhausted { attempts } => attempts,
            _ => &[],
        }
    }

    /// Static label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::InvalidRequest(_) => "invalid_request",
            TransportError::NoConnectionsAvailable { .. } => "no_connections",
            TransportError::RetriesExhausted { .. } => "retries_exhausted",
            TransportError::ResponseTooLarge { .. } => "response_too_large",
            TransportError::Serialization(_) => "serialization",
        }
    }
}
