//! Domain layer for the tree adoption services.
//!
//! This crate provides the entities shared by the reservation and payment sides:
//! - Species and plots with finite planting capacity
//! - Adoption intents with a closed status state machine
//! - Trees and their care log
//! - Payment transactions with their own status state machine

pub mod adoption;
pub mod catalog;
pub mod error;
pub mod payment;

pub use adoption::{AdoptionIntent, IntentStatus, LogEntry, TREE_PLANTED_ACTIVITY, Tree};
pub use catalog::{Plot, Species};
pub use error::DomainError;
pub use payment::{PaymentStatus, Transaction, TransactionKind};
