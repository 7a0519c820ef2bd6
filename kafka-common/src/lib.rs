//! Shared Kafka publishing and consuming layer for the services.
//!
//! This crate sits on top of `rdkafka` and `tokio` and gives every service the
//! same three pieces:
//!
//! - the fixed topic names ([`Topics`], [`Topic`]),
//! - [`EventConsumer`], which decodes each record into a typed payload, runs
//!   the service's [`EventHandler`] and acknowledges the record on success,
//! - [`EventProducer`], which serializes a payload, hands it to the broker
//!   without blocking and logs the delivery outcome.
//!
//! [`Listener`] wires an `EventConsumer` to an rdkafka consumer loop.
//!
//! Decode failures are logged and dropped, handler failures are logged and
//! returned to the caller, send failures are logged. Retries, dead-letter
//! routing and delivery guarantees are left to the broker client.
//!
//! # Example Producer
//!
//! ```no_run
//! use kafka_common::{EventProducer, KafkaMessage, Topics};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct UserSignedUp {
//!     user_id: u64,
//! }
//!
//! impl KafkaMessage for UserSignedUp {
//!     const TOPIC: &'static str = Topics::USER_SIGNUP;
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let producer = EventProducer::new("localhost:9092")?;
//!     let event = UserSignedUp { user_id: 123 };
//!
//!     let outcome = producer.publish(Some(event.user_id), &event)?.outcome().await?;
//!     assert!(outcome.is_delivered());
//!     Ok(())
//! }
//! ```

mod config;
mod consumer;
mod decode;
mod error;
mod handler;
mod listener;
mod producer;
mod record;

pub use config::{ConsumerConfig, ProducerConfig, DEFAULT_BROKERS, DEFAULT_GROUP_ID};
pub use consumer::{Acknowledgment, Dispatch, EventConsumer};
pub use decode::{Json, PayloadDecoder};
pub use error::{KafkaError, Result};
pub use handler::{handler_fn, EventHandler, HandlerFn};
pub use listener::{Listener, ShutdownHandle};
pub use producer::{DeliveryHandle, DeliveryOutcome, DeliveryReport, DeliverySink, EventProducer};
pub use record::InboundRecord;

/// Re-export the topic registry and message trait for convenience
pub use kafka_topics::{KafkaMessage, Topic, Topics, UnknownTopic};
