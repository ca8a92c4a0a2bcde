//! Payment transaction entity.

use chrono::{DateTime, Utc};
use common::{TransactionId, UserId};
use serde::{Deserialize, Serialize};

use super::status::{PaymentStatus, TransactionKind};

/// A payment owned by a user: either settled from the wallet or backed by an
/// external invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub owner_id: UserId,
    pub amount: i64,
    pub kind: TransactionKind,
    /// Correlates an ADOPT transaction back to its adoption intent.
    pub reference_id: Option<String>,
    pub status: PaymentStatus,
    pub payment_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// A transaction settled immediately from the owner's balance.
    pub fn settled(
        owner_id: UserId,
        amount: i64,
        kind: TransactionKind,
        reference_id: Option<String>,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            owner_id,
            amount,
            kind,
            reference_id,
            status: PaymentStatus::Success,
            payment_url: None,
            expires_at: None,
            created_at: Utc::now(),
        }
    }

    /// A transaction awaiting an external invoice payment until `expires_at`.
    pub fn pending(
        owner_id: UserId,
        amount: i64,
        kind: TransactionKind,
        reference_id: Option<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            owner_id,
            amount,
            kind,
            reference_id,
            status: PaymentStatus::Pending,
            payment_url: None,
            expires_at: Some(expires_at),
            created_at: Utc::now(),
        }
    }

    /// Returns the reference id of an ADOPT transaction, ignoring blank references.
    pub fn adoption_reference(&self) -> Option<&str> {
        match (self.kind, self.reference_id.as_deref()) {
            (TransactionKind::Adopt, Some(reference)) if !reference.is_empty() => Some(reference),
            _ => None,
        }
    }
}
