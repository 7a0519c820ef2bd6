//! Raw inbound records as handed over by the broker client.

use rdkafka::message::Message;
use std::borrow::Cow;

/// Key as it appears in log lines: the key itself, or `-` when absent.
pub(crate) fn log_key(key: Option<&str>) -> &str {
    key.unwrap_or("-")
}

/// One message as delivered by the broker, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRecord {
    pub topic: String,
    /// Ordering key, if the producer set one.
    pub key: Option<String>,
    pub payload: Vec<u8>,
    pub partition: i32,
    pub offset: i64,
}

impl InboundRecord {
    /// Creates a record at partition 0, offset 0, without a key.
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            key: None,
            payload: payload.into(),
            partition: 0,
            offset: 0,
        }
    }

    /// Sets the record key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets the partition and offset the record was read from.
    pub fn with_position(mut self, partition: i32, offset: i64) -> Self {
        self.partition = partition;
        self.offset = offset;
        self
    }

    /// Copies the fields of an rdkafka message.
    ///
    /// A missing payload (tombstone) becomes an empty body. Keys that are not
    /// valid UTF-8 are converted lossily.
    pub fn from_message<M: Message>(message: &M) -> Self {
        Self {
            topic: message.topic().to_string(),
            key: message
                .key()
                .map(|key| String::from_utf8_lossy(key).into_owned()),
            payload: message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
            partition: message.partition(),
            offset: message.offset(),
        }
    }

    /// The record key, if any.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// The body as text, for log lines.
    pub fn body_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}
