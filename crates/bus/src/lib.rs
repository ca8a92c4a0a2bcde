//! Event bus adapter.
//!
//! Decouples "payment settled/expired" from "materialize tree/release capacity":
//! - [`EventBus`] publishes raw messages under dot-separated topics and binds
//!   handlers to AMQP-style topic patterns
//! - [`EventBusExt::publish_json`] is the fire-and-forget publish used by services
//! - [`InMemoryEventBus`] runs everything in-process
//! - `AmqpEventBus` (feature `amqp`) talks to RabbitMQ
//!
//! Handlers that fail never stop their consumer; the message goes to a
//! dead-letter sink instead.

#[cfg(feature = "amqp")]
pub mod amqp;
pub mod error;
pub mod event_bus;
pub mod events;
pub mod memory;
pub mod topic;

#[cfg(feature = "amqp")]
pub use amqp::{AmqpConfig, AmqpEventBus, DEFAULT_EXCHANGE};
pub use error::{BusError, Result};
pub use event_bus::{EventBus, EventBusExt, EventHandler, HandlerError};
pub use events::{PAYMENT_EXPIRED, PAYMENT_SUCCESS, PaymentEvent};
pub use memory::{BusMessage, DeadLetter, InMemoryEventBus};
pub use topic::topic_matches;
