//! Consumer loop feeding an [`EventConsumer`].

use crate::config::ConsumerConfig;
use crate::consumer::{Acknowledgment, Dispatch, EventConsumer};
use crate::decode::PayloadDecoder;
use crate::error::{KafkaError, Result};
use crate::handler::EventHandler;
use crate::record::InboundRecord;
use rdkafka::consumer::{CommitMode, Consumer as RdConsumer, StreamConsumer};
use rdkafka::{Offset, TopicPartitionList};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// How long a seek back to a failed record may block.
const SEEK_TIMEOUT: Duration = Duration::from_secs(1);

/// Offset moves the loop makes on the consumer.
trait OffsetControl: Send + Sync {
    /// Commits the position after `record`.
    fn commit_after(&self, record: &InboundRecord) -> Result<()>;

    /// Moves the fetch position of `record`'s partition back to `record`, so
    /// it is delivered again on a following poll.
    fn rewind_to(&self, record: &InboundRecord) -> Result<()>;
}

impl OffsetControl for StreamConsumer {
    fn commit_after(&self, record: &InboundRecord) -> Result<()> {
        let mut offsets = TopicPartitionList::new();
        offsets.add_partition_offset(
            &record.topic,
            record.partition,
            Offset::Offset(record.offset + 1),
        )?;
        self.commit(&offsets, CommitMode::Async)?;
        Ok(())
    }

    fn rewind_to(&self, record: &InboundRecord) -> Result<()> {
        self.seek(
            &record.topic,
            record.partition,
            Offset::Offset(record.offset),
            SEEK_TIMEOUT,
        )?;
        Ok(())
    }
}

/// Commits the offset following one record.
struct CommitAck<'a, C: ?Sized> {
    control: &'a C,
    record: &'a InboundRecord,
}

impl<C: OffsetControl + ?Sized> Acknowledgment for CommitAck<'_, C> {
    fn acknowledge(&self) -> Result<()> {
        self.control.commit_after(self.record)
    }
}

/// Dispatches one polled record and moves offsets according to the outcome.
///
/// A failed handler rewinds the partition to the failed record, so the same
/// message comes back on the next poll instead of being passed over by the
/// commit of a later record.
async fn process_record<T, H, D, C>(
    dispatcher: &EventConsumer<H>,
    decoder: &D,
    control: &C,
    auto_commit: bool,
    record: &InboundRecord,
) where
    T: Send + 'static,
    H: EventHandler<T>,
    D: PayloadDecoder<T>,
    C: OffsetControl,
{
    let ack = CommitAck { control, record };
    let ack: Option<&dyn Acknowledgment> = if auto_commit { None } else { Some(&ack) };

    match dispatcher.dispatch::<T, D>(record, decoder, ack).await {
        Ok(Dispatch::Discarded) => {
            debug!(
                "Skipped undecodable message at topic '{}' (partition: {}, offset: {})",
                record.topic, record.partition, record.offset
            );
        }
        Ok(_) => {}
        Err(e) => {
            warn!(
                "Handler failed at topic '{}' (partition: {}, offset: {}): {}. Seeking back for redelivery",
                record.topic, record.partition, record.offset, e
            );
            if let Err(e) = control.rewind_to(record) {
                error!(
                    "Failed to seek back to topic '{}' (partition: {}, offset: {}): {}",
                    record.topic, record.partition, record.offset, e
                );
            }
        }
    }
}

/// Polls Kafka and dispatches every record of the subscribed topics to one
/// [`EventConsumer`].
///
/// With auto-commit disabled (the default) each handled record is committed
/// through its acknowledgment handle. When the handler fails, the partition
/// is sought back to the failed record so it is delivered again; there is no
/// backoff and no attempt limit. Undecodable records are skipped.
pub struct Listener<T, H, D> {
    inner: StreamConsumer,
    topics: Vec<String>,
    dispatcher: EventConsumer<H>,
    decoder: D,
    config: ConsumerConfig,
    shutdown: Arc<RwLock<bool>>,
    _payload: PhantomData<fn() -> T>,
}

impl<T, H, D> Listener<T, H, D>
where
    T: Send + 'static,
    H: EventHandler<T>,
    D: PayloadDecoder<T>,
{
    /// Creates the underlying rdkafka consumer.
    ///
    /// # Arguments
    ///
    /// * `config` - Consumer configuration
    /// * `topics` - Topics whose records go to `dispatcher`
    /// * `dispatcher` - Dispatcher wrapping the service handler
    /// * `decoder` - Payload decoder for the records of these topics
    ///
    /// # Errors
    ///
    /// Returns an error if the consumer cannot be created or if `topics`
    /// contains an empty name.
    pub fn new(
        config: ConsumerConfig,
        topics: &[&str],
        dispatcher: EventConsumer<H>,
        decoder: D,
    ) -> Result<Self> {
        if topics.iter().any(|topic| topic.is_empty()) {
            return Err(KafkaError::InvalidTopic);
        }

        info!(
            "Creating Kafka consumer with brokers: {}, group: {}",
            config.brokers, config.group_id
        );

        let consumer: StreamConsumer = config.client_config().create()?;

        Ok(Self {
            inner: consumer,
            topics: topics.iter().map(|topic| topic.to_string()).collect(),
            dispatcher,
            decoder,
            config,
            shutdown: Arc::new(RwLock::new(false)),
            _payload: PhantomData,
        })
    }

    /// Subscribes to the configured topics.
    ///
    /// # Errors
    ///
    /// Returns an error if subscription fails.
    pub fn subscribe(&self) -> Result<()> {
        let topics: Vec<&str> = self.topics.iter().map(String::as_str).collect();
        info!("Subscribing to topics: {:?}", topics);

        self.inner.subscribe(&topics)?;
        Ok(())
    }

    /// Consumes until [`shutdown`](Self::shutdown) is requested.
    ///
    /// # Errors
    ///
    /// Currently always returns `Ok`; receive errors are logged and the loop
    /// keeps polling.
    pub async fn run(&self) -> Result<()> {
        info!("Starting consumer loop");

        loop {
            if *self.shutdown.read().await {
                info!("Shutdown signal received, stopping consumer");
                break;
            }

            // Poll with a timeout so the shutdown flag is seen.
            let record = match tokio::time::timeout(Duration::from_secs(1), self.inner.recv()).await {
                Ok(Ok(message)) => InboundRecord::from_message(&message),
                Ok(Err(e)) => {
                    error!("Error receiving message: {}", e);
                    sleep(Duration::from_secs(1)).await;
                    continue;
                }
                Err(_) => continue,
            };

            process_record::<T, H, D, _>(
                &self.dispatcher,
                &self.decoder,
                &self.inner,
                self.config.auto_commit,
                &record,
            )
            .await;
        }

        info!("Consumer stopped");
        Ok(())
    }

    /// Requests a graceful shutdown of the loop.
    pub async fn shutdown(&self) {
        info!("Requesting consumer shutdown");
        let mut shutdown = self.shutdown.write().await;
        *shutdown = true;
    }

    /// Returns a handle that can stop the loop from another task.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            shutdown: Arc::clone(&self.shutdown),
        }
    }
}

/// Handle for requesting consumer shutdown from another task.
#[derive(Clone)]
pub struct ShutdownHandle {
    shutdown: Arc<RwLock<bool>>,
}

impl ShutdownHandle {
    /// Requests a graceful shutdown of the consumer.
    pub async fn shutdown(&self) {
        info!("Requesting consumer shutdown via handle");
        let mut shutdown = self.shutdown.write().await;
        *shutdown = true;
    }
}
