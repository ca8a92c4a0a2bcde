use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::Result;

/// Error type returned by event handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Consumer callback invoked for each delivered message.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Returns the name of this handler, used in logs and dead letters.
    fn name(&self) -> &'static str;

    /// Handles one raw message body.
    ///
    /// Returning an error routes the message to the dead-letter sink. The
    /// consumer keeps running either way.
    async fn handle(&self, payload: &[u8]) -> std::result::Result<(), HandlerError>;
}

/// Topic-based publish/subscribe over a single named exchange.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publishes a raw message under `topic`.
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<()>;

    /// Binds a private consumer to `pattern` and delivers matching messages to
    /// `handler` on a background task.
    ///
    /// Messages published before this call returns are not guaranteed to reach
    /// the handler.
    async fn subscribe(&self, pattern: &str, handler: Arc<dyn EventHandler>) -> Result<()>;
}

/// Extension trait providing convenience methods for event buses.
#[async_trait]
pub trait EventBusExt: EventBus {
    /// Serializes `event` as JSON and publishes it, fire-and-forget.
    ///
    /// Failures are logged and counted, never returned. Returns whether the
    /// message reached the transport.
    async fn publish_json<T>(&self, topic: &str, event: &T) -> bool
    where
        T: Serialize + Sync + ?Sized,
    {
        let payload = match serde_json::to_vec(event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(topic, error = %e, "failed to serialize event");
                metrics::counter!("bus_publish_failures_total", "topic" => topic.to_string())
                    .increment(1);
                return false;
            }
        };

        match self.publish(topic, &payload).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(topic, error = %e, "failed to publish event");
                metrics::counter!("bus_publish_failures_total", "topic" => topic.to_string())
                    .increment(1);
                false
            }
        }
    }
}

impl<T: EventBus + ?Sized> EventBusExt for T {}
