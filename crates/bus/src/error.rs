use thiserror::Error;

/// Errors raised by an event bus transport.
#[derive(Debug, Error)]
pub enum BusError {
    /// The broker could not be reached or a channel could not be opened.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A message could not be handed to the broker.
    #[error("Publish error: {0}")]
    Publish(String),

    /// A consumer queue could not be declared, bound, or consumed.
    #[error("Subscribe error: {0}")]
    Subscribe(String),

    /// An event could not be serialized to its wire format.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for bus operations.
pub type Result<T> = std::result::Result<T, BusError>;
