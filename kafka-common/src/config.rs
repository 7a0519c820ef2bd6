//! Client configuration for producers and consumers.

use rdkafka::ClientConfig;
use std::time::Duration;

/// Broker list used when `KAFKA_BROKERS` is not set.
pub const DEFAULT_BROKERS: &str = "localhost:9092";

/// Consumer group used when `KAFKA_GROUP_ID` is not set.
pub const DEFAULT_GROUP_ID: &str = "kafka-common-consumer";

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Configuration for the Kafka consumer.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Comma-separated list of Kafka brokers.
    pub brokers: String,

    /// Consumer group ID.
    pub group_id: String,

    /// Whether the client commits offsets on its own (default: false, the
    /// dispatcher acknowledges each handled message).
    pub auto_commit: bool,

    /// Where to start when the group has no committed offset.
    pub auto_offset_reset: String,

    /// Group session timeout.
    pub session_timeout: Duration,
}

impl ConsumerConfig {
    /// Creates a new consumer configuration.
    ///
    /// # Arguments
    ///
    /// * `brokers` - Comma-separated list of Kafka brokers
    /// * `group_id` - Consumer group ID
    pub fn new(brokers: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self {
            brokers: brokers.into(),
            group_id: group_id.into(),
            auto_commit: false,
            auto_offset_reset: "earliest".to_string(),
            session_timeout: Duration::from_secs(6),
        }
    }

    /// Reads `KAFKA_BROKERS` and `KAFKA_GROUP_ID`, falling back to
    /// [`DEFAULT_BROKERS`] and [`DEFAULT_GROUP_ID`].
    pub fn from_env() -> Self {
        Self::new(
            env_or("KAFKA_BROKERS", DEFAULT_BROKERS),
            env_or("KAFKA_GROUP_ID", DEFAULT_GROUP_ID),
        )
    }

    /// Enables auto-commit. Acknowledgment handles are then not passed to
    /// the dispatcher.
    pub fn with_auto_commit(mut self, enabled: bool) -> Self {
        self.auto_commit = enabled;
        self
    }

    /// Sets `auto.offset.reset` (`earliest`, `latest`, ...).
    pub fn with_auto_offset_reset(mut self, reset: impl Into<String>) -> Self {
        self.auto_offset_reset = reset.into();
        self
    }

    /// Sets the group session timeout.
    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }

    /// Builds the rdkafka client configuration.
    pub fn client_config(&self) -> ClientConfig {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &self.brokers)
            .set("group.id", &self.group_id)
            .set("enable.auto.commit", self.auto_commit.to_string())
            .set("auto.offset.reset", &self.auto_offset_reset)
            .set("session.timeout.ms", self.session_timeout.as_millis().to_string())
            .set("enable.partition.eof", "false");
        client_config
    }
}

/// Configuration for the Kafka producer.
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Comma-separated list of Kafka brokers.
    pub brokers: String,

    /// How long librdkafka keeps trying to deliver a message before
    /// reporting failure.
    pub message_timeout: Duration,

    pub queue_buffering_max_messages: u32,

    pub queue_buffering_max_kbytes: u32,

    pub batch_num_messages: u32,
}

impl ProducerConfig {
    /// Creates a producer configuration with the library defaults.
    pub fn new(brokers: impl Into<String>) -> Self {
        Self {
            brokers: brokers.into(),
            message_timeout: Duration::from_secs(5),
            queue_buffering_max_messages: 100_000,
            queue_buffering_max_kbytes: 1_048_576,
            batch_num_messages: 10_000,
        }
    }

    /// Reads `KAFKA_BROKERS`, falling back to [`DEFAULT_BROKERS`].
    pub fn from_env() -> Self {
        Self::new(env_or("KAFKA_BROKERS", DEFAULT_BROKERS))
    }

    /// Sets the delivery timeout.
    pub fn with_message_timeout(mut self, timeout: Duration) -> Self {
        self.message_timeout = timeout;
        self
    }

    /// Sets the local queue limits.
    pub fn with_queue_limits(mut self, max_messages: u32, max_kbytes: u32) -> Self {
        self.queue_buffering_max_messages = max_messages;
        self.queue_buffering_max_kbytes = max_kbytes;
        self
    }

    /// Sets the maximum batch size.
    pub fn with_batch_num_messages(mut self, batch: u32) -> Self {
        self.batch_num_messages = batch;
        self
    }

    /// Builds the rdkafka client configuration.
    pub fn client_config(&self) -> ClientConfig {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &self.brokers)
            .set("message.timeout.ms", self.message_timeout.as_millis().to_string())
            .set(
                "queue.buffering.max.messages",
                self.queue_buffering_max_messages.to_string(),
            )
            .set(
                "queue.buffering.max.kbytes",
                self.queue_buffering_max_kbytes.to_string(),
            )
            .set("batch.num.messages", self.batch_num_messages.to_string());
        client_config
    }
}
