//! Service-side business logic seam.

use async_trait::async_trait;
use std::fmt;
use std::future::Future;

/// Business logic invoked for every successfully decoded message.
///
/// Errors returned here are logged by the dispatcher and handed back to the
/// caller unchanged; [`Listener`](crate::Listener) then seeks back so the
/// message is delivered again.
#[async_trait]
pub trait EventHandler<T: Send + 'static>: Send + Sync {
    type Error: fmt::Display + Send;

    /// Handles one payload. `key` is the record key, when the producer set one.
    async fn on_message(&self, payload: T, key: Option<&str>) -> Result<(), Self::Error>;
}

/// Handler built from an async function, see [`handler_fn`].
#[derive(Clone)]
pub struct HandlerFn<F>(F);

/// Wraps an async function `Fn(T, Option<String>) -> Future<Output = Result<(), E>>`
/// as an [`EventHandler`].
///
/// ```
/// use kafka_common::{handler_fn, EventConsumer};
///
/// let consumer = EventConsumer::new(handler_fn(|ids: Vec<u64>, _key: Option<String>| async move {
///     anyhow::ensure!(!ids.is_empty(), "empty batch");
///     Ok(())
/// }));
/// # let _ = consumer;
/// ```
pub fn handler_fn<F>(f: F) -> HandlerFn<F> {
    HandlerFn(f)
}

#[async_trait]
impl<T, F, Fut, E> EventHandler<T> for HandlerFn<F>
where
    T: Send + 'static,
    F: Fn(T, Option<String>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    type Error = E;

    async fn on_message(&self, payload: T, key: Option<&str>) -> Result<(), E> {
        (self.0)(payload, key.map(str::to_owned)).await
    }
}
