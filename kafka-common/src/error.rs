//! Error types for the Kafka library.

use thiserror::Error;

/// Result type alias for Kafka operations.
pub type Result<T> = std::result::Result<T, KafkaError>;

/// Errors that can occur during Kafka operations.
///
/// Handler failures are not represented here: the dispatcher hands them back
/// in the handler's own error type.
#[derive(Error, Debug)]
pub enum KafkaError {
    /// Error from the underlying rdkafka library.
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    /// Error serializing a message to JSON.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error deserializing a message body into its payload type.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// A send was attempted with an empty topic name.
    #[error("Topic name must not be empty")]
    InvalidTopic,

    /// `send` was called outside a tokio runtime, so the delivery could not
    /// be awaited.
    #[error("No tokio runtime available to await the delivery")]
    NoRuntime,

    /// The delivery report was dropped before the broker answered.
    #[error("Delivery canceled before completion")]
    Canceled,
}
