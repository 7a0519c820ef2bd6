//! Topic names shared by every service, and the typed message trait.
//!
//! The set of topics is fixed at build time. Services refer to them either
//! through the [`Topics`] constants or through the [`Topic`] enum when the
//! logical purpose needs to be carried around as a value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Topic name constants.
///
/// `Topics` has no variants, so it can never be instantiated; only the
/// associated constants are reachable.
///
/// ```compile_fail
/// let _registry = kafka_topics::Topics {};
/// ```
#[derive(Debug)]
pub enum Topics {}

impl Topics {
    /// Movie data collected by the content service for the recommend service.
    pub const MOVIE_INGESTION: &'static str = "content.movie.ingestion";

    /// User sign-up events published by the user service.
    pub const USER_SIGNUP: &'static str = "user.lifecycle.signup";

    /// User activity log consumed by the recommend service.
    pub const USER_ACTIVITY: &'static str = "user.activity.log";
}

/// Logical purpose of a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    MovieIngestion,
    UserSignup,
    UserActivity,
}

impl Topic {
    /// Every known topic, in declaration order.
    pub const ALL: [Topic; 3] = [Topic::MovieIngestion, Topic::UserSignup, Topic::UserActivity];

    /// The wire name of the topic.
    pub const fn as_str(self) -> &'static str {
        match self {
            Topic::MovieIngestion => Topics::MOVIE_INGESTION,
            Topic::UserSignup => Topics::USER_SIGNUP,
            Topic::UserActivity => Topics::USER_ACTIVITY,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Topic {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Returned when a string does not name a known topic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown topic: {0}")]
pub struct UnknownTopic(pub String);

impl FromStr for Topic {
    type Err = UnknownTopic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Topic::ALL
            .into_iter()
            .find(|topic| topic.as_str() == s)
            .ok_or_else(|| UnknownTopic(s.to_string()))
    }
}

/// Trait for types that can be sent as Kafka messages.
///
/// Implementors bind the payload type to the topic it travels on, so a
/// producer can route it and a consumer can decode it without repeating the
/// topic name.
///
/// # Example
///
/// ```
/// use kafka_topics::{KafkaMessage, Topics};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct UserSignedUp {
///     user_id: u64,
///     email: String,
/// }
///
/// impl KafkaMessage for UserSignedUp {
///     const TOPIC: &'static str = Topics::USER_SIGNUP;
/// }
/// ```
pub trait KafkaMessage: Serialize + for<'de> Deserialize<'de> + Send + Sync {
    /// The Kafka topic where messages of this type are sent.
    const TOPIC: &'static str;
}
