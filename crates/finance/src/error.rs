use common::TransactionId;
use store::StoreError;
use thiserror::Error;

use crate::invoice::InvoiceError;

/// Errors raised by the payment side.
#[derive(Debug, Error)]
pub enum FinanceError {
    /// The request was rejected before any state changed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The webhook body was malformed or did not name a transaction.
    #[error("Invalid webhook: {0}")]
    InvalidWebhook(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// The external invoice provider could not create an invoice.
    #[error("Invoice provider error: {0}")]
    Invoice(#[from] InvoiceError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for finance operations.
pub type Result<T> = std::result::Result<T, FinanceError>;
