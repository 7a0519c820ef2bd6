//! Example producer publishing movie and activity events.
//!
//! To run this example:
//! ```bash
//! cargo run --example producer
//! ```
//!
//! Make sure you have a Kafka broker running on localhost:9092 (or set
//! `KAFKA_BROKERS`).

use kafka_common::{EventProducer, KafkaMessage, ProducerConfig, Topics};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Movie collected by the content service
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MovieIngested {
    movie_id: u64,
    title: String,
    genres: Vec<String>,
}

impl KafkaMessage for MovieIngested {
    const TOPIC: &'static str = Topics::MOVIE_INGESTION;
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserActivity {
    action: String,
    movie_id: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let config = ProducerConfig::from_env();
    let producer = EventProducer::from_config(&config)?;
    info!("Producer created for {}", config.brokers);

    let mut pending = Vec::new();

    for movie_id in 1001..=1003 {
        let movie = MovieIngested {
            movie_id,
            title: format!("Movie {}", movie_id),
            genres: vec!["drama".to_string()],
        };
        // The movie id keeps every update of one movie on the same partition.
        pending.push(producer.publish(Some(movie.movie_id), &movie)?);
    }

    for (user_id, movie_id) in [(42, 1001), (42, 1002), (7, 1003)] {
        let activity = UserActivity {
            action: "view".to_string(),
            movie_id,
        };
        pending.push(producer.send(Topics::USER_ACTIVITY, Some(user_id), &activity)?);
    }

    for handle in pending {
        let outcome = handle.outcome().await?;
        if !outcome.is_delivered() {
            warn!("Not delivered to {}", outcome.topic());
        }
    }

    producer.flush(Duration::from_secs(5))?;
    info!("Done");
    Ok(())
}
