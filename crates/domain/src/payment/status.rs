//! Payment state machine and transaction kinds.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The status of a payment transaction.
///
/// State transitions:
/// ```text
/// Pending ──┬──────────────► Success
///           └──► Expired ───────┘
/// ```
/// A settlement reported after expiry still moves the payment to Success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Waiting for the provider to report settlement.
    #[default]
    Pending,

    /// Money received (terminal state).
    Success,

    /// The invoice lapsed without payment.
    Expired,
}

impl PaymentStatus {
    /// Returns true if the transition table allows moving to `next`.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (
                PaymentStatus::Pending,
                PaymentStatus::Success | PaymentStatus::Expired
            ) | (PaymentStatus::Expired, PaymentStatus::Success)
        )
    }

    /// Checks the transition table, returning an error for disallowed moves.
    pub fn ensure_transition(&self, next: PaymentStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(DomainError::InvalidTransition {
                entity: "payment",
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }

    /// Returns the persisted status name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Success => "SUCCESS",
            PaymentStatus::Expired => "EXPIRED",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(PaymentStatus::Pending),
            "SUCCESS" => Ok(PaymentStatus::Success),
            "EXPIRED" => Ok(PaymentStatus::Expired),
            other => Err(DomainError::UnknownStatus {
                entity: "payment",
                value: other.to_string(),
            }),
        }
    }
}

/// What a transaction pays for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    /// Payment for a tree adoption; the reference id names the adoption intent.
    Adopt,
    /// Wallet top-up; settles into the owner's balance.
    Deposit,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Adopt => "ADOPT",
            TransactionKind::Deposit => "DEPOSIT",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADOPT" => Ok(TransactionKind::Adopt),
            "DEPOSIT" => Ok(TransactionKind::Deposit),
            other => Err(DomainError::UnknownKind(other.to_string())),
        }
    }
}
