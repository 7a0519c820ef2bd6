//! Integration tests for the Kafka library, run without a broker.

use futures::future::{BoxFuture, FutureExt};
use kafka_common::{
    handler_fn, Acknowledgment, DeliveryOutcome, DeliveryReport, DeliverySink, Dispatch,
    EventConsumer, EventProducer, InboundRecord, Json, KafkaError, KafkaMessage, Topics,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserActivity {
    action: String,
    movie_id: u64,
}

impl KafkaMessage for UserActivity {
    const TOPIC: &'static str = Topics::USER_ACTIVITY;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MovieDto {
    id: u64,
    title: String,
}

impl KafkaMessage for MovieDto {
    const TOPIC: &'static str = Topics::MOVIE_INGESTION;
}

#[derive(Default)]
struct CountingAck(AtomicUsize);

impl CountingAck {
    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl Acknowledgment for CountingAck {
    fn acknowledge(&self) -> kafka_common::Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Sink whose deliveries are completed by the test.
#[derive(Default)]
struct ManualSink {
    pending: Mutex<Vec<oneshot::Sender<kafka_common::Result<DeliveryReport>>>>,
    keys: Mutex<Vec<Option<String>>>,
}

impl ManualSink {
    fn complete(&self, result: kafka_common::Result<DeliveryReport>) {
        let sender = self.pending.lock().unwrap().remove(0);
        let _ = sender.send(result);
    }
}

impl DeliverySink for ManualSink {
    fn enqueue(
        &self,
        _topic: &str,
        key: Option<&str>,
        _payload: &[u8],
    ) -> BoxFuture<'static, kafka_common::Result<DeliveryReport>> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().push(tx);
        self.keys.lock().unwrap().push(key.map(str::to_owned));
        async move { rx.await.unwrap_or(Err(KafkaError::Canceled)) }.boxed()
    }
}

fn movie() -> MovieDto {
    MovieDto {
        id: 1001,
        title: "Arrival".to_string(),
    }
}

#[tokio::test]
async fn test_activity_is_handled_and_acknowledged() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    let consumer = EventConsumer::new(handler_fn(move |activity: UserActivity, key: Option<String>| {
        let recorder = Arc::clone(&recorder);
        async move {
            recorder.lock().unwrap().push((activity, key));
            Ok::<_, anyhow::Error>(())
        }
    }));
    let ack = CountingAck::default();
    let record = InboundRecord::new(Topics::USER_ACTIVITY, r#"{"action":"view","movieId":7}"#)
        .with_key("42")
        .with_position(0, 15);

    let outcome = consumer
        .dispatch(&record, &Json::<UserActivity>::new(), Some(&ack))
        .await
        .unwrap();

    assert_eq!(outcome, Dispatch::Acknowledged);
    assert_eq!(ack.count(), 1);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![(
            UserActivity {
                action: "view".to_string(),
                movie_id: 7
            },
            Some("42".to_string())
        )]
    );
}

#[tokio::test]
async fn test_invalid_json_never_reaches_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let consumer = EventConsumer::new(handler_fn(move |_: UserActivity, _: Option<String>| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, anyhow::Error>(()) }
    }));
    let ack = CountingAck::default();
    let record = InboundRecord::new(Topics::USER_ACTIVITY, "not valid json").with_key("42");

    let outcome = consumer
        .dispatch(&record, &Json::<UserActivity>::new(), Some(&ack))
        .await;

    assert!(matches!(outcome, Ok(Dispatch::Discarded)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(ack.count(), 0);
}

#[tokio::test]
async fn test_handler_error_propagates_without_ack() {
    let consumer = EventConsumer::new(handler_fn(|_: UserActivity, _: Option<String>| async {
        Err::<(), _>(anyhow::anyhow!("downstream unavailable"))
    }));
    let ack = CountingAck::default();
    let record = InboundRecord::new(Topics::USER_ACTIVITY, r#"{"action":"view","movieId":7}"#);

    for _ in 0..2 {
        let err = consumer
            .dispatch(&record, &Json::<UserActivity>::new(), Some(&ack))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "downstream unavailable");
    }
    assert_eq!(ack.count(), 0);
}

#[tokio::test]
async fn test_send_returns_before_delivery() {
    let producer = EventProducer::with_sink(ManualSink::default());

    let handle = producer
        .send(Topics::MOVIE_INGESTION, Some(1001), &movie())
        .unwrap();

    assert_eq!(producer.sink().pending.lock().unwrap().len(), 1);
    assert_eq!(*producer.sink().keys.lock().unwrap(), vec![Some("1001".to_string())]);

    producer.sink().complete(Ok(DeliveryReport {
        partition: 1,
        offset: 0,
    }));

    match handle.outcome().await.unwrap() {
        DeliveryOutcome::Delivered {
            topic,
            key,
            partition,
            offset,
        } => {
            assert_eq!(topic, "content.movie.ingestion");
            assert_eq!(key.as_deref(), Some("1001"));
            assert_eq!(partition, 1);
            assert!(offset >= 0);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_send_reports_payload_and_cause() {
    let producer = EventProducer::with_sink(ManualSink::default());

    let handle = producer.publish(Some(movie().id), &movie()).unwrap();
    producer.sink().complete(Err(KafkaError::Canceled));

    match handle.outcome().await.unwrap() {
        DeliveryOutcome::Failed {
            topic,
            key,
            payload,
            cause,
        } => {
            assert_eq!(topic, "content.movie.ingestion");
            assert_eq!(key.as_deref(), Some("1001"));
            assert_eq!(payload, r#"{"id":1001,"title":"Arrival"}"#);
            assert!(matches!(cause, KafkaError::Canceled));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_dropped_delivery_is_reported_as_failure() {
    let producer = EventProducer::with_sink(ManualSink::default());

    let handle = producer.send_unkeyed(Topics::USER_SIGNUP, &movie()).unwrap();
    producer.sink().pending.lock().unwrap().clear();

    let outcome = handle.outcome().await.unwrap();

    assert!(!outcome.is_delivered());
    assert_eq!(outcome.key(), None);
}
