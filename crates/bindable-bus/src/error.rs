//! Error types for the transport.

use thiserror::Error;

/// Errors produced by the publish/subscribe transport.
#[derive(Debug, Error)]
pub enum BusError {
    /// Channel names must be non-empty.
    #[error("invalid channel name: {0:?}")]
    InvalidChannel(String),

    /// A message payload did not match the expected shape.
    #[error("message decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Convenience alias used throughout the bus crate.
pub type Result<T> = std::result::Result<T, BusError>;
