//! Adoption intent state machine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The status of an adoption intent.
///
/// State transitions:
/// ```text
/// Pending ──┬──► Completed
///           ├──► Failed
///           └──► Expired
/// ```
/// All three outcomes are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentStatus {
    /// Capacity is reserved and payment has been requested.
    #[default]
    Pending,

    /// Payment confirmed and the tree was materialized (terminal state).
    Completed,

    /// Payment could not be requested; capacity was released (terminal state).
    Failed,

    /// Payment never arrived; capacity was released (terminal state).
    Expired,
}

impl IntentStatus {
    /// Returns true if the transition table allows moving to `next`.
    pub fn can_transition_to(&self, next: IntentStatus) -> bool {
        matches!(
            (self, next),
            (
                IntentStatus::Pending,
                IntentStatus::Completed | IntentStatus::Failed | IntentStatus::Expired
            )
        )
    }

    /// Checks the transition table, returning an error for disallowed moves.
    pub fn ensure_transition(&self, next: IntentStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(DomainError::InvalidTransition {
                entity: "adoption intent",
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        !matches!(self, IntentStatus::Pending)
    }

    /// Returns the persisted status name.
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentStatus::Pending => "PENDING",
            IntentStatus::Completed => "COMPLETED",
            IntentStatus::Failed => "FAILED",
            IntentStatus::Expired => "EXPIRED",
        }
    }
}

impl std::fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IntentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(IntentStatus::Pending),
            "COMPLETED" => Ok(IntentStatus::Completed),
            "FAILED" => Ok(IntentStatus::Failed),
            "EXPIRED" => Ok(IntentStatus::Expired),
            other => Err(DomainError::UnknownStatus {
                entity: "adoption intent",
                value: other.to_string(),
            }),
        }
    }
}
