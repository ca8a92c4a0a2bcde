//! Payment side of the saga: transactions and their status.

mod status;
mod transaction;

pub use status::{PaymentStatus, TransactionKind};
pub use transaction::Transaction;
