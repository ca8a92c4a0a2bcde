//! Domain error types.

use thiserror::Error;

/// Errors raised by domain rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A status change that is not in the entity's transition table.
    #[error("Invalid {entity} status transition: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: &'static str,
        to: &'static str,
    },

    /// A persisted status string that does not name a known status.
    #[error("Unknown {entity} status: {value}")]
    UnknownStatus { entity: &'static str, value: String },

    /// A persisted transaction kind that does not name a known kind.
    #[error("Unknown transaction kind: {0}")]
    UnknownKind(String),
}
