//! Error types for model operations.

use thiserror::Error;

/// Errors that can occur while building or mutating a model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Only objects and arrays can be wrapped into a model.
    #[error("value is not observable: expected an object or array, got {kind}")]
    NotObservable { kind: &'static str },

    /// Expression names must be non-empty.
    #[error("expression name must be a non-empty string")]
    InvalidExpressionName,

    /// No expression is registered under this name.
    #[error("expression {name:?} is not defined")]
    ExpressionNotDefined { name: String },

    /// An array operation was applied to an object node.
    #[error("node at chain {chain:?} is not an array")]
    NotAnArray { chain: String },

    /// An array was written through a key that is not an index.
    #[error("invalid array key {key:?} at chain {chain:?}")]
    InvalidIndex { chain: String, key: String },

    /// An array write would grow the array past the configured maximum length.
    #[error("array key {key:?} at chain {chain:?} exceeds the maximum length {max}")]
    IndexOutOfRange { chain: String, key: String, max: usize },

    /// A new key was added to a node after `prevent_extensions`.
    #[error("cannot add {key:?}: node at chain {chain:?} is not extensible")]
    NotExtensible { chain: String, key: String },

    /// Serializing a snapshot failed.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// The transport rejected an operation.
    #[error("transport error: {0}")]
    Bus(#[from] bindable_bus::BusError),

    /// Invalid model configuration.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error while loading configuration.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
