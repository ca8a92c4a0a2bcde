//! External services the adoption saga calls out to.

pub mod payment;

pub use payment::{InMemoryPaymentService, PaymentService};
