//! # Error Types
//!
//! Failure taxonomy of the coordination layer. Transport and decode failures
//! are contained at the transport boundary; only request-level outcomes
//! cross into caller-visible results.

use playernet_protocol::EncodeError;
use std::time::Duration;
use thiserror::Error;

/// The underlying bus client could not connect, or the connection was lost.
///
/// Fatal to in-flight publishes; recoverable by calling again (the transport
/// retries connection establishment on the next subscribe-worthy call).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Bus connection failed: {reason}")]
pub struct ConnectionError {
    /// Human-readable cause from the bus client.
    pub reason: String,
}

impl ConnectionError {
    /// Build from anything displayable.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The bus is unreachable or the connection was lost.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// The transport was closed; no further publishes or subscribes.
    #[error("Transport is closed")]
    Closed,

    /// The outgoing payload could not be encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Errors surfaced to a caller awaiting a connect request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// No response arrived within the deadline. The pending entry has been
    /// reclaimed; a late response will be dropped.
    #[error("No connect response within {after:?}")]
    Timeout {
        /// The deadline that elapsed.
        after: Duration,
    },

    /// The bus was shut down while the request was pending.
    #[error("Connect request cancelled by shutdown")]
    Cancelled,

    /// The request could not be published.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
