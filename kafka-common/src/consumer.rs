//! Typed dispatch of inbound records to service handlers.

use crate::decode::PayloadDecoder;
use crate::error::Result;
use crate::handler::EventHandler;
use crate::record::{log_key, InboundRecord};
use std::time::Instant;
use tracing::{debug, error};

/// Capability to commit the offset of one received message.
#[cfg_attr(test, mockall::automock)]
pub trait Acknowledgment: Send + Sync {
    /// Marks the message as processed.
    fn acknowledge(&self) -> Result<()>;
}

/// What happened to a dispatched record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Handled, and the acknowledgment handle was invoked.
    Acknowledged,
    /// Handled, no acknowledgment handle was supplied.
    Handled,
    /// The body could not be decoded. The handler was not called and the
    /// record was not acknowledged.
    Discarded,
}

/// Generic entry point for every consumed message.
///
/// Decodes the record body, runs the service handler and acknowledges the
/// record once the handler succeeds. Undecodable bodies are logged and
/// dropped since a retry would fail the same way; handler errors are logged
/// and returned as-is so the message can be delivered again.
///
/// # Example
///
/// ```
/// use kafka_common::{handler_fn, Dispatch, EventConsumer, InboundRecord, Json};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Activity {
///     action: String,
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let consumer = EventConsumer::new(handler_fn(|activity: Activity, _key: Option<String>| async move {
///     assert_eq!(activity.action, "view");
///     Ok::<_, anyhow::Error>(())
/// }));
///
/// let record = InboundRecord::new("user.activity.log", r#"{"action":"view"}"#).with_key("42");
/// let outcome = consumer.dispatch(&record, &Json::<Activity>::new(), None).await;
/// assert_eq!(outcome.unwrap(), Dispatch::Handled);
/// # }
/// ```
pub struct EventConsumer<H> {
    handler: H,
}

impl<H> EventConsumer<H> {
    /// Creates a dispatcher around the service handler.
    pub fn new(handler: H) -> Self {
        Self { handler }
    }

    /// The wrapped service handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Dispatches one record.
    ///
    /// # Arguments
    ///
    /// * `record` - The raw record from the broker
    /// * `decoder` - How to rebuild the payload type from the body
    /// * `ack` - Commit handle, `None` when the client commits on its own
    ///
    /// # Errors
    ///
    /// Returns the handler's error, unchanged, when the handler fails.
    /// Decoding failures are not errors here; they yield
    /// [`Dispatch::Discarded`].
    pub async fn dispatch<T, D>(
        &self,
        record: &InboundRecord,
        decoder: &D,
        ack: Option<&dyn Acknowledgment>,
    ) -> std::result::Result<Dispatch, H::Error>
    where
        T: Send + 'static,
        D: PayloadDecoder<T> + ?Sized,
        H: EventHandler<T>,
    {
        let topic = record.topic.as_str();
        let key = log_key(record.key());
        let started = Instant::now();

        debug!(
            "Kafka receive start: topic=[{}], key=[{}], length=[{}]",
            topic,
            key,
            record.payload.len()
        );

        let payload = match decoder.decode(&record.payload) {
            Ok(payload) => payload,
            Err(e) => {
                error!(
                    "Kafka parsing error: topic=[{}], key=[{}], message=[{}]: {}",
                    topic,
                    key,
                    record.body_lossy(),
                    e
                );
                return Ok(Dispatch::Discarded);
            }
        };

        if let Err(e) = self.handler.on_message(payload, record.key()).await {
            error!("Kafka logic error: topic=[{}], key=[{}]: {}", topic, key, e);
            return Err(e);
        }

        let outcome = match ack {
            Some(ack) => {
                if let Err(e) = ack.acknowledge() {
                    error!(
                        "Failed to acknowledge message: topic=[{}], partition=[{}], offset=[{}]: {}",
                        topic, record.partition, record.offset, e
                    );
                }
                Dispatch::Acknowledged
            }
            None => Dispatch::Handled,
        };

        debug!(
            "Kafka receive success: topic=[{}], processed in {}ms",
            topic,
            started.elapsed().as_millis()
        );

        Ok(outcome)
    }
}
