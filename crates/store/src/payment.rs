use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{TransactionId, UserId};
use domain::{PaymentStatus, Transaction};

use crate::Result;

/// Persistence for the payment side: transactions and wallet balances.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn create_transaction(&self, tx: Transaction) -> Result<Transaction>;

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>>;

    /// Moves a transaction from `from` to `to` if its current status is still `from`.
    ///
    /// Same contract as `ReservationStore::transition_intent`.
    async fn transition_payment(
        &self,
        id: TransactionId,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> Result<bool>;

    /// Records the provider's invoice URL and authoritative expiry.
    async fn update_invoice_details(
        &self,
        id: TransactionId,
        payment_url: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Returns all pending transactions whose expiry is strictly before `before`.
    async fn pending_before(&self, before: DateTime<Utc>) -> Result<Vec<Transaction>>;

    /// Returns an owner's transactions, newest first.
    async fn transactions_for(&self, owner_id: UserId) -> Result<Vec<Transaction>>;

    /// Returns an owner's wallet balance; owners without a wallet have 0.
    async fn balance(&self, owner_id: UserId) -> Result<i64>;

    /// Adds `amount` to the wallet and returns the new balance.
    async fn credit(&self, owner_id: UserId, amount: i64) -> Result<i64>;

    /// Subtracts `amount` if the balance covers it. Returns `false` without
    /// changing anything otherwise.
    async fn try_debit(&self, owner_id: UserId, amount: i64) -> Result<bool>;
}
