//! Example consumer handling the user activity log.
//!
//! To run this example:
//! ```bash
//! cargo run --example consumer
//! ```
//!
//! Make sure you have a Kafka broker running on localhost:9092 (or set
//! `KAFKA_BROKERS` / `KAFKA_GROUP_ID`). Run the producer example in another
//! terminal to generate messages.

use async_trait::async_trait;
use kafka_common::{ConsumerConfig, EventConsumer, EventHandler, Json, KafkaMessage, Listener, Topics};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::signal;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserActivity {
    action: String,
    movie_id: u64,
}

impl KafkaMessage for UserActivity {
    const TOPIC: &'static str = Topics::USER_ACTIVITY;
}

/// Counts views per run; stands in for the recommend service logic.
#[derive(Default)]
struct ActivityHandler {
    views: AtomicU64,
}

#[async_trait]
impl EventHandler<UserActivity> for ActivityHandler {
    type Error = anyhow::Error;

    async fn on_message(&self, activity: UserActivity, key: Option<&str>) -> anyhow::Result<()> {
        anyhow::ensure!(!activity.action.is_empty(), "activity without action");

        if activity.action == "view" {
            let views = self.views.fetch_add(1, Ordering::Relaxed) + 1;
            info!(
                "User {:?} viewed movie {} ({} views so far)",
                key, activity.movie_id, views
            );
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder().with_max_level(Level::DEBUG).init();

    let config = ConsumerConfig::from_env();
    let (topic, decoder) = Json::<UserActivity>::for_message();

    let listener = Listener::new(
        config,
        &[topic],
        EventConsumer::new(ActivityHandler::default()),
        decoder,
    )?;
    listener.subscribe()?;

    let shutdown_handle = listener.shutdown_handle();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal (Ctrl+C)");
            shutdown_handle.shutdown().await;
        }
    });

    info!("Consuming {}... Press Ctrl+C to stop", topic);
    listener.run().await?;

    info!("Consumer shut down gracefully");
    Ok(())
}
