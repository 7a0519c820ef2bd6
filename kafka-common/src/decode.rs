//! Payload decoders: the runtime description of how to rebuild a typed
//! payload from a message body.

use crate::error::{KafkaError, Result};
use kafka_topics::KafkaMessage;
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;

/// Turns a raw message body into a `T`.
pub trait PayloadDecoder<T>: Send + Sync {
    /// Decodes `body`.
    ///
    /// # Errors
    ///
    /// Returns [`KafkaError::Deserialization`] when the body does not
    /// describe a `T`.
    fn decode(&self, body: &[u8]) -> Result<T>;
}

/// JSON decoder for any serde type.
///
/// ```
/// use kafka_common::{Json, PayloadDecoder};
///
/// let ids: Vec<u64> = Json::<Vec<u64>>::new().decode(b"[1,2,3]").unwrap();
/// assert_eq!(ids, vec![1, 2, 3]);
/// ```
pub struct Json<T>(PhantomData<fn() -> T>);

impl<T> Json<T> {
    pub const fn new() -> Self {
        Json(PhantomData)
    }
}

impl<T: KafkaMessage> Json<T> {
    /// Decoder for a message type together with the topic it belongs to.
    pub const fn for_message() -> (&'static str, Self) {
        (T::TOPIC, Json::new())
    }
}

impl<T> Default for Json<T> {
    fn default() -> Self {
        Json::new()
    }
}

impl<T> Clone for Json<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Json<T> {}

impl<T> fmt::Debug for Json<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Json<{}>", std::any::type_name::<T>())
    }
}

impl<T: DeserializeOwned> PayloadDecoder<T> for Json<T> {
    fn decode(&self, body: &[u8]) -> Result<T> {
        serde_json::from_slice(body).map_err(|e| KafkaError::Deserialization(e.to_string()))
    }
}
