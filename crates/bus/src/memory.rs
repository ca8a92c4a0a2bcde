//! In-process event bus built on a tokio broadcast channel.
//!
//! Every subscription gets its own receiver and consumer task; topic filtering
//! happens on the consumer side. The most recent published messages and dead
//! letters are kept for inspection by tests and the development server.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, error, info, warn};

use crate::topic::topic_matches;
use crate::{BusError, EventBus, EventHandler, Result};

const CHANNEL_CAPACITY: usize = 1024;

/// Default number of published messages and dead letters retained.
const HISTORY_LIMIT: usize = 1024;

/// A message as it travelled over the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// A message a handler failed to process.
#[derive(Debug, Clone)]
pub struct DeadLetter {
    pub message: BusMessage,
    pub handler: &'static str,
    pub error: String,
}

struct Inner {
    sender: broadcast::Sender<Arc<BusMessage>>,
    // Serializes publish against subscribe so `in_flight` counts every receiver.
    send_lock: Mutex<()>,
    in_flight: AtomicUsize,
    published: RwLock<VecDeque<BusMessage>>,
    dead_letters: RwLock<VecDeque<DeadLetter>>,
    history_limit: usize,
    fail_on_publish: AtomicBool,
}

fn record<T>(history: &mut VecDeque<T>, item: T, limit: usize) {
    if history.len() >= limit {
        history.pop_front();
    }
    history.push_back(item);
}

/// In-memory event bus for tests and single-process deployments.
#[derive(Clone)]
pub struct InMemoryEventBus {
    inner: Arc<Inner>,
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::with_history_limit(HISTORY_LIMIT)
    }

    /// Creates a bus that retains at most `limit` published messages and
    /// `limit` dead letters, dropping the oldest first.
    pub fn with_history_limit(limit: usize) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                sender,
                send_lock: Mutex::new(()),
                in_flight: AtomicUsize::new(0),
                published: RwLock::new(VecDeque::new()),
                dead_letters: RwLock::new(VecDeque::new()),
                history_limit: limit.max(1),
                fail_on_publish: AtomicBool::new(false),
            }),
        }
    }

    /// Makes subsequent publishes fail with a publish error.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.inner.fail_on_publish.store(fail, Ordering::SeqCst);
    }

    /// Returns the retained published messages, oldest first.
    pub async fn published(&self) -> Vec<BusMessage> {
        self.inner.published.read().await.iter().cloned().collect()
    }

    /// Returns the messages published under `topic`.
    pub async fn published_on(&self, topic: &str) -> Vec<BusMessage> {
        self.inner
            .published
            .read()
            .await
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }

    /// Returns the retained messages handlers failed to process.
    pub async fn dead_letters(&self) -> Vec<DeadLetter> {
        self.inner.dead_letters.read().await.iter().cloned().collect()
    }

    /// Waits until every subscriber has finished with every message published
    /// so far.
    pub async fn settle(&self) {
        while self.inner.in_flight.load(Ordering::SeqCst) > 0 {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    }

    fn send(&self, message: BusMessage) -> usize {
        let _guard = self
            .inner
            .send_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let receivers = self.inner.sender.receiver_count();
        if receivers == 0 {
            return 0;
        }
        self.inner.in_flight.fetch_add(receivers, Ordering::SeqCst);
        match self.inner.sender.send(Arc::new(message)) {
            Ok(count) => count,
            Err(_) => {
                self.inner.in_flight.fetch_sub(receivers, Ordering::SeqCst);
                0
            }
        }
    }

    fn receiver(&self) -> broadcast::Receiver<Arc<BusMessage>> {
        let _guard = self
            .inner
            .send_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.inner.sender.subscribe()
    }

    async fn deliver(inner: &Inner, handler: &dyn EventHandler, message: &BusMessage) {
        debug!(topic = %message.topic, handler = handler.name(), "delivering message");

        if let Err(e) = handler.handle(&message.payload).await {
            warn!(
                topic = %message.topic,
                handler = handler.name(),
                error = %e,
                "handler failed, dead-lettering message"
            );
            metrics::counter!("bus_dead_letters_total", "topic" => message.topic.clone())
                .increment(1);
            let dead = DeadLetter {
                message: message.clone(),
                handler: handler.name(),
                error: e.to_string(),
            };
            record(&mut *inner.dead_letters.write().await, dead, inner.history_limit);
        }
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<()> {
        if self.inner.fail_on_publish.load(Ordering::SeqCst) {
            return Err(BusError::Publish("simulated publish failure".to_string()));
        }

        let message = BusMessage {
            topic: topic.to_string(),
            payload: payload.to_vec(),
        };
        record(
            &mut *self.inner.published.write().await,
            message.clone(),
            self.inner.history_limit,
        );

        let receivers = self.send(message);
        debug!(topic, receivers, "published message");
        Ok(())
    }

    async fn subscribe(&self, pattern: &str, handler: Arc<dyn EventHandler>) -> Result<()> {
        let mut receiver = self.receiver();
        let inner = Arc::clone(&self.inner);
        let pattern = pattern.to_string();

        info!(pattern = %pattern, handler = handler.name(), "consumer started");

        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(message) => {
                        if topic_matches(&pattern, &message.topic) {
                            Self::deliver(&inner, handler.as_ref(), &message).await;
                        }
                        inner.in_flight.fetch_sub(1, Ordering::SeqCst);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        error!(skipped, pattern = %pattern, "consumer lagged, messages skipped");
                        inner
                            .in_flight
                            .fetch_sub(skipped as usize, Ordering::SeqCst);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!(pattern = %pattern, "bus closed, stopping consumer");
                        break;
                    }
                }
            }
        });

        Ok(())
    }
}
