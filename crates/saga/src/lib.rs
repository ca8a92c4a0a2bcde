//! Adoption saga.
//!
//! One adoption runs as a two-party saga between the reservation side and the
//! payment side:
//! 1. Reserve plot capacity and record a pending intent
//! 2. Request payment (wallet or external invoice)
//! 3. On `payment.success`, complete the intent and plant the tree
//! 4. On `payment.expired`, expire the intent and release the capacity
//!
//! A failed payment request compensates immediately inside step 2.

pub mod consumers;
pub mod coordinator;
pub mod error;
pub mod services;
pub mod state;

pub use consumers::{PaymentExpiredHandler, PaymentSucceededHandler, start_consumers};
pub use coordinator::{AdoptionSaga, AdoptionStarted, AdoptionView, BeginAdoption, EventOutcome};
pub use error::{Result, SagaError};
pub use services::{InMemoryPaymentService, PaymentService};
pub use state::SagaState;
