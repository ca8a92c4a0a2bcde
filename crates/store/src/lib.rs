//! Persistence for the adoption and payment sides.
//!
//! Each side is described by a trait with an in-memory implementation for tests
//! and local runs, and a PostgreSQL implementation for production. Every status
//! change goes through a compare-and-set so concurrent handlers cannot both win.

pub mod error;
pub mod memory;
pub mod payment;
pub mod postgres;
pub mod reservation;

pub use error::{Result, StoreError};
pub use memory::{InMemoryPaymentStore, InMemoryReservationStore};
pub use payment::PaymentStore;
pub use postgres::{PostgresPaymentStore, PostgresReservationStore};
pub use reservation::{CapacityLedger, Reservation, ReservationStore};
