//! Fire-and-forget Kafka producer with delivery logging.

use crate::config::ProducerConfig;
use crate::error::{KafkaError, Result};
use crate::record::log_key;
use futures::future::{self, BoxFuture, FutureExt};
use kafka_topics::KafkaMessage;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer as RdProducer};
use rdkafka::ClientConfig;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Where a delivered record ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub partition: i32,
    pub offset: i64,
}

/// The broker client side of a send.
///
/// `enqueue` must hand the record over without waiting on the network; the
/// returned future resolves once the broker confirmed or refused it.
pub trait DeliverySink: Send + Sync + 'static {
    fn enqueue(
        &self,
        topic: &str,
        key: Option<&str>,
        payload: &[u8],
    ) -> BoxFuture<'static, Result<DeliveryReport>>;
}

impl DeliverySink for FutureProducer {
    fn enqueue(
        &self,
        topic: &str,
        key: Option<&str>,
        payload: &[u8],
    ) -> BoxFuture<'static, Result<DeliveryReport>> {
        let record = FutureRecord {
            topic,
            partition: None,
            payload: Some(payload),
            key,
            timestamp: None,
            headers: None,
        };

        match self.send_result(record) {
            Ok(delivery) => async move {
                match delivery.await {
                    Ok(Ok((partition, offset))) => Ok(DeliveryReport { partition, offset }),
                    Ok(Err((kafka_err, _msg))) => Err(KafkaError::Kafka(kafka_err)),
                    Err(_canceled) => Err(KafkaError::Canceled),
                }
            }
            .boxed(),
            Err((kafka_err, _record)) => future::ready(Err(KafkaError::Kafka(kafka_err))).boxed(),
        }
    }
}

/// Final state of one send, reported exactly once.
#[derive(Debug)]
pub enum DeliveryOutcome {
    Delivered {
        topic: String,
        key: Option<String>,
        partition: i32,
        offset: i64,
    },
    Failed {
        topic: String,
        key: Option<String>,
        /// The serialized payload, kept for diagnosis.
        payload: String,
        cause: KafkaError,
    },
}

impl DeliveryOutcome {
    /// Whether the broker confirmed the record.
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }

    /// Topic the record was sent to.
    pub fn topic(&self) -> &str {
        match self {
            DeliveryOutcome::Delivered { topic, .. } | DeliveryOutcome::Failed { topic, .. } => topic,
        }
    }

    /// Key the record was sent with, in string form.
    pub fn key(&self) -> Option<&str> {
        match self {
            DeliveryOutcome::Delivered { key, .. } | DeliveryOutcome::Failed { key, .. } => {
                key.as_deref()
            }
        }
    }

    fn log(&self) {
        match self {
            DeliveryOutcome::Delivered {
                topic,
                key,
                partition,
                offset,
            } => debug!(
                "Kafka send success: topic=[{}], key=[{}], partition=[{}], offset=[{}]",
                topic,
                log_key(key.as_deref()),
                partition,
                offset
            ),
            DeliveryOutcome::Failed {
                topic,
                key,
                payload,
                cause,
            } => error!(
                "Kafka send failed: topic=[{}], key=[{}], payload=[{}]: {}",
                topic,
                log_key(key.as_deref()),
                payload,
                cause
            ),
        }
    }
}

/// Handle on a pending send.
///
/// Dropping it does not cancel the delivery; the outcome is logged either way.
#[derive(Debug)]
pub struct DeliveryHandle(JoinHandle<DeliveryOutcome>);

impl DeliveryHandle {
    /// Waits for the delivery outcome.
    ///
    /// # Errors
    ///
    /// Returns [`KafkaError::Canceled`] if the delivery task was aborted,
    /// for instance because the runtime shut down.
    pub async fn outcome(self) -> Result<DeliveryOutcome> {
        self.0.await.map_err(|_| KafkaError::Canceled)
    }
}

/// Kafka producer shared by a service.
///
/// `send` serializes the payload to JSON, hands it to the broker client and
/// returns at once. A tokio task waits for the delivery report and logs it:
/// success at debug level with partition and offset, failure at error level
/// with the payload and the cause. Failed sends are not retried.
///
/// The delivery is awaited on the current tokio runtime; calling `send`
/// outside one returns [`KafkaError::NoRuntime`].
///
/// # Example
///
/// ```no_run
/// use kafka_common::{EventProducer, Topics};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Movie {
///     id: u64,
///     title: String,
/// }
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let producer = EventProducer::new("localhost:9092")?;
///     let movie = Movie { id: 1001, title: "Arrival".to_string() };
///
///     producer.send(Topics::MOVIE_INGESTION, Some(movie.id), &movie)?;
///     Ok(())
/// }
/// ```
pub struct EventProducer<S = FutureProducer> {
    sink: S,
}

impl EventProducer<FutureProducer> {
    /// Creates a producer with the default configuration.
    ///
    /// # Arguments
    ///
    /// * `brokers` - Comma-separated list of Kafka brokers (e.g., "localhost:9092")
    ///
    /// # Errors
    ///
    /// Returns an error if the producer cannot be created.
    pub fn new(brokers: &str) -> Result<Self> {
        Self::from_config(&ProducerConfig::new(brokers))
    }

    /// Creates a producer from a [`ProducerConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the producer cannot be created.
    pub fn from_config(config: &ProducerConfig) -> Result<Self> {
        info!("Creating Kafka producer with brokers: {}", config.brokers);
        Self::from_client_config(config.client_config())
    }

    /// Creates a producer from a pre-built rdkafka configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the producer cannot be created.
    pub fn from_client_config(config: ClientConfig) -> Result<Self> {
        let producer: FutureProducer = config.create()?;
        Ok(Self { sink: producer })
    }

    /// Flushes any pending messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    pub fn flush(&self, timeout: Duration) -> Result<()> {
        RdProducer::flush(&self.sink, timeout)?;
        Ok(())
    }
}

impl<S: DeliverySink> EventProducer<S> {
    /// Creates a producer over any broker client.
    pub fn with_sink(sink: S) -> Self {
        Self { sink }
    }

    /// The broker client records are handed to.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Sends `payload` to `topic` without waiting for delivery.
    ///
    /// The key, when present, is converted to its string form; the broker
    /// uses it to keep related messages on one partition.
    ///
    /// # Errors
    ///
    /// Only argument problems are reported here: an empty topic name, a
    /// payload that cannot be serialized, or a call made outside a tokio
    /// runtime ([`KafkaError::NoRuntime`]). Delivery failures are reported
    /// through the returned [`DeliveryHandle`] and the log.
    pub fn send<K, V>(&self, topic: &str, key: Option<K>, payload: &V) -> Result<DeliveryHandle>
    where
        K: fmt::Display,
        V: Serialize + ?Sized,
    {
        if topic.is_empty() {
            return Err(KafkaError::InvalidTopic);
        }

        let runtime = Handle::try_current().map_err(|_| KafkaError::NoRuntime)?;

        let key = key.map(|key| key.to_string());
        let payload =
            serde_json::to_vec(payload).map_err(|e| KafkaError::Serialization(e.to_string()))?;

        debug!(
            "Sending message to topic '{}' with key '{}' ({} bytes)",
            topic,
            log_key(key.as_deref()),
            payload.len()
        );

        let delivery = self.sink.enqueue(topic, key.as_deref(), &payload);
        let topic = topic.to_string();

        let task = runtime.spawn(async move {
            let outcome = match delivery.await {
                Ok(report) => DeliveryOutcome::Delivered {
                    topic,
                    key,
                    partition: report.partition,
                    offset: report.offset,
                },
                Err(cause) => DeliveryOutcome::Failed {
                    topic,
                    key,
                    payload: String::from_utf8_lossy(&payload).into_owned(),
                    cause,
                },
            };
            outcome.log();
            outcome
        });

        Ok(DeliveryHandle(task))
    }

    /// Sends `payload` to `topic` without a key.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub fn send_unkeyed<V>(&self, topic: &str, payload: &V) -> Result<DeliveryHandle>
    where
        V: Serialize + ?Sized,
    {
        self.send(topic, None::<&str>, payload)
    }

    /// Sends a typed message to the topic named by its [`KafkaMessage`] impl.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub fn publish<T, K>(&self, key: Option<K>, message: &T) -> Result<DeliveryHandle>
    where
        T: KafkaMessage,
        K: fmt::Display,
    {
        self.send(T::TOPIC, key, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    type Enqueued = (String, Option<String>, Vec<u8>);

    /// Accepts everything and reports a fixed position.
    #[derive(Default)]
    struct AcceptingSink {
        enqueued: Mutex<Vec<Enqueued>>,
    }

    impl DeliverySink for AcceptingSink {
        fn enqueue(
            &self,
            topic: &str,
            key: Option<&str>,
            payload: &[u8],
        ) -> BoxFuture<'static, Result<DeliveryReport>> {
            self.enqueued.lock().unwrap().push((
                topic.to_string(),
                key.map(str::to_owned),
                payload.to_vec(),
            ));
            future::ready(Ok(DeliveryReport {
                partition: 2,
                offset: 41,
            }))
            .boxed()
        }
    }

    #[derive(Serialize, serde::Deserialize)]
    struct Signup {
        user_id: u64,
    }

    impl KafkaMessage for Signup {
        const TOPIC: &'static str = "user.lifecycle.signup";
    }

    #[tokio::test]
    async fn numeric_key_is_sent_as_string() {
        let producer = EventProducer::with_sink(AcceptingSink::default());

        let outcome = producer
            .send("content.movie.ingestion", Some(1001), &serde_json::json!({"id": 1001}))
            .unwrap()
            .outcome()
            .await
            .unwrap();

        let enqueued = producer.sink().enqueued.lock().unwrap();
        assert_eq!(enqueued[0].1.as_deref(), Some("1001"));
        assert_eq!(enqueued[0].2, br#"{"id":1001}"#);
        assert_eq!(outcome.key(), Some("1001"));
    }

    #[tokio::test]
    async fn unkeyed_send_has_no_key() {
        let producer = EventProducer::with_sink(AcceptingSink::default());

        let outcome = producer
            .send_unkeyed("user.activity.log", "ping")
            .unwrap()
            .outcome()
            .await
            .unwrap();

        assert_eq!(outcome.key(), None);
        assert_eq!(producer.sink().enqueued.lock().unwrap()[0].2, br#""ping""#);
    }

    #[tokio::test]
    async fn publish_routes_by_message_type() {
        let producer = EventProducer::with_sink(AcceptingSink::default());

        let outcome = producer
            .publish(Some(7), &Signup { user_id: 7 })
            .unwrap()
            .outcome()
            .await
            .unwrap();

        assert!(outcome.is_delivered());
        assert_eq!(outcome.topic(), "user.lifecycle.signup");
    }

    #[test]
    fn send_outside_runtime_is_an_error() {
        let producer = EventProducer::with_sink(AcceptingSink::default());

        let err = producer
            .send("user.activity.log", Some("42"), &1)
            .unwrap_err();

        assert!(matches!(err, KafkaError::NoRuntime));
        assert!(producer.sink().enqueued.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_topic_is_rejected_eagerly() {
        let producer = EventProducer::with_sink(AcceptingSink::default());

        let err = producer.send("", Some("k"), &1).unwrap_err();

        assert!(matches!(err, KafkaError::InvalidTopic));
        assert!(producer.sink().enqueued.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unserializable_payload_is_rejected_eagerly() {
        let producer = EventProducer::with_sink(AcceptingSink::default());
        let mut payload = std::collections::HashMap::new();
        payload.insert((1, 2), "tuple keys are not valid JSON object keys");

        let err = producer.send_unkeyed("user.activity.log", &payload).unwrap_err();

        assert!(matches!(err, KafkaError::Serialization(_)));
        assert!(producer.sink().enqueued.lock().unwrap().is_empty());
    }
}
