//! Saga error types.

use bus::BusError;
use common::{IntentId, PlotId, SpeciesId};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during saga operations.
#[derive(Debug, Error)]
pub enum SagaError {
    /// Malformed identifiers or payloads; nothing was changed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Species not found: {0}")]
    SpeciesNotFound(SpeciesId),

    #[error("Plot not found: {0}")]
    PlotNotFound(PlotId),

    #[error("Adoption intent not found: {0}")]
    IntentNotFound(IntentId),

    /// The plot cannot fit the species; nothing was changed.
    #[error("Insufficient space on plot {plot_id}: {available} available, {required} required")]
    InsufficientSpace {
        plot_id: PlotId,
        available: i64,
        required: i64,
    },

    /// The payment side failed; the reservation has been compensated.
    #[error("Payment service error: {0}")]
    PaymentService(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Event bus error: {0}")]
    Bus(#[from] BusError),
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
