use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{IntentId, PlotId, SpeciesId, TransactionId, TreeId, UserId};
use domain::{
    AdoptionIntent, IntentStatus, LogEntry, PaymentStatus, Plot, Species, Transaction, Tree,
};
use tokio::sync::RwLock;

use crate::error::ensure_positive;
use crate::{
    CapacityLedger, PaymentStore, Reservation, ReservationStore, Result, StoreError,
};

#[derive(Debug, Default)]
struct ReservationState {
    species: HashMap<SpeciesId, Species>,
    plots: HashMap<PlotId, Plot>,
    intents: HashMap<IntentId, AdoptionIntent>,
    trees: HashMap<TreeId, Tree>,
    logs: Vec<LogEntry>,
}

/// In-memory reservation store and capacity ledger.
///
/// Every operation takes the write lock for its whole read-modify-write, which
/// gives the same single-row atomicity as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryReservationStore {
    state: Arc<RwLock<ReservationState>>,
    fail_on_create_tree: Arc<AtomicBool>,
}

impl InMemoryReservationStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent `create_tree` calls fail with a database error.
    pub fn set_fail_on_create_tree(&self, fail: bool) {
        self.fail_on_create_tree.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of materialized trees.
    pub async fn tree_count(&self) -> usize {
        self.state.read().await.trees.len()
    }

    /// Returns the number of adoption intents ever created.
    pub async fn intent_count(&self) -> usize {
        self.state.read().await.intents.len()
    }
}

#[async_trait]
impl CapacityLedger for InMemoryReservationStore {
    async fn reserve(&self, plot_id: PlotId, amount: i64) -> Result<Reservation> {
        ensure_positive(amount)?;
        let mut state = self.state.write().await;
        let plot = state
            .plots
            .get_mut(&plot_id)
            .ok_or_else(|| StoreError::not_found("plot", plot_id))?;

        if !plot.has_room_for(amount) {
            return Ok(Reservation::Insufficient);
        }
        plot.available_capacity -= amount;
        Ok(Reservation::Reserved)
    }

    async fn release(&self, plot_id: PlotId, amount: i64) -> Result<()> {
        ensure_positive(amount)?;
        let mut state = self.state.write().await;
        let plot = state
            .plots
            .get_mut(&plot_id)
            .ok_or_else(|| StoreError::not_found("plot", plot_id))?;

        plot.available_capacity = (plot.available_capacity + amount).min(plot.total_capacity);
        Ok(())
    }
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn insert_species(&self, species: Species) -> Result<Species> {
        let mut state = self.state.write().await;
        state.species.insert(species.id, species.clone());
        Ok(species)
    }

    async fn get_species(&self, id: SpeciesId) -> Result<Option<Species>> {
        Ok(self.state.read().await.species.get(&id).cloned())
    }

    async fn insert_plot(&self, plot: Plot) -> Result<Plot> {
        let mut state = self.state.write().await;
        state.plots.insert(plot.id, plot.clone());
        Ok(plot)
    }

    async fn get_plot(&self, id: PlotId) -> Result<Option<Plot>> {
        Ok(self.state.read().await.plots.get(&id).cloned())
    }

    async fn create_intent(&self, intent: AdoptionIntent) -> Result<AdoptionIntent> {
        let mut state = self.state.write().await;
        state.intents.insert(intent.id, intent.clone());
        Ok(intent)
    }

    async fn get_intent(&self, id: IntentId) -> Result<Option<AdoptionIntent>> {
        Ok(self.state.read().await.intents.get(&id).cloned())
    }

    async fn transition_intent(
        &self,
        id: IntentId,
        from: IntentStatus,
        to: IntentStatus,
    ) -> Result<bool> {
        from.ensure_transition(to)?;
        let mut state = self.state.write().await;
        let intent = state
            .intents
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("adoption intent", id))?;

        if intent.status != from {
            return Ok(false);
        }
        intent.status = to;
        Ok(true)
    }

    async fn create_tree(&self, tree: Tree) -> Result<bool> {
        if self.fail_on_create_tree.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let mut state = self.state.write().await;
        if state.trees.values().any(|t| t.intent_id == tree.intent_id) {
            return Ok(false);
        }
        state.trees.insert(tree.id, tree);
        Ok(true)
    }

    async fn find_tree_by_intent(&self, intent_id: IntentId) -> Result<Option<Tree>> {
        let state = self.state.read().await;
        Ok(state
            .trees
            .values()
            .find(|t| t.intent_id == intent_id)
            .cloned())
    }

    async fn create_log(&self, entry: LogEntry) -> Result<LogEntry> {
        let mut state = self.state.write().await;
        state.logs.push(entry.clone());
        Ok(entry)
    }

    async fn logs_for_tree(&self, tree_id: TreeId) -> Result<Vec<LogEntry>> {
        let state = self.state.read().await;
        let mut logs: Vec<_> = state
            .logs
            .iter()
            .filter(|l| l.tree_id == tree_id)
            .cloned()
            .collect();
        logs.sort_by_key(|l| l.recorded_at);
        Ok(logs)
    }
}

#[derive(Debug, Default)]
struct PaymentState {
    transactions: HashMap<TransactionId, Transaction>,
    wallets: HashMap<UserId, i64>,
    failing_transitions: HashSet<TransactionId>,
}

/// In-memory payment store.
#[derive(Clone, Default)]
pub struct InMemoryPaymentStore {
    state: Arc<RwLock<PaymentState>>,
}

impl InMemoryPaymentStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites an owner's wallet balance.
    pub async fn set_balance(&self, owner_id: UserId, balance: i64) {
        self.state.write().await.wallets.insert(owner_id, balance);
    }

    /// Rewrites a transaction's expiry, e.g. to simulate an invoice lapsing.
    pub async fn set_expires_at(&self, id: TransactionId, expires_at: DateTime<Utc>) {
        if let Some(tx) = self.state.write().await.transactions.get_mut(&id) {
            tx.expires_at = Some(expires_at);
        }
    }

    /// Makes status transitions of one transaction fail with a database error.
    pub async fn set_fail_on_transition(&self, id: TransactionId, fail: bool) {
        let mut state = self.state.write().await;
        if fail {
            state.failing_transitions.insert(id);
        } else {
            state.failing_transitions.remove(&id);
        }
    }

    /// Returns the number of stored transactions.
    pub async fn transaction_count(&self) -> usize {
        self.state.read().await.transactions.len()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn create_transaction(&self, tx: Transaction) -> Result<Transaction> {
        ensure_positive(tx.amount)?;
        let mut state = self.state.write().await;
        state.transactions.insert(tx.id, tx.clone());
        Ok(tx)
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>> {
        Ok(self.state.read().await.transactions.get(&id).cloned())
    }

    async fn transition_payment(
        &self,
        id: TransactionId,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> Result<bool> {
        from.ensure_transition(to)?;
        let mut state = self.state.write().await;
        if state.failing_transitions.contains(&id) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let tx = state
            .transactions
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("transaction", id))?;

        if tx.status != from {
            return Ok(false);
        }
        tx.status = to;
        Ok(true)
    }

    async fn update_invoice_details(
        &self,
        id: TransactionId,
        payment_url: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let tx = state
            .transactions
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("transaction", id))?;

        tx.payment_url = Some(payment_url.to_string());
        tx.expires_at = Some(expires_at);
        Ok(())
    }

    async fn pending_before(&self, before: DateTime<Utc>) -> Result<Vec<Transaction>> {
        let state = self.state.read().await;
        let mut txs: Vec<_> = state
            .transactions
            .values()
            .filter(|tx| {
                tx.status == PaymentStatus::Pending
                    && tx.expires_at.is_some_and(|expires| expires < before)
            })
            .cloned()
            .collect();
        txs.sort_by_key(|tx| tx.expires_at);
        Ok(txs)
    }

    async fn transactions_for(&self, owner_id: UserId) -> Result<Vec<Transaction>> {
        let state = self.state.read().await;
        let mut txs: Vec<_> = state
            .transactions
            .values()
            .filter(|tx| tx.owner_id == owner_id)
            .cloned()
            .collect();
        txs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(txs)
    }

    async fn balance(&self, owner_id: UserId) -> Result<i64> {
        Ok(self
            .state
            .read()
            .await
            .wallets
            .get(&owner_id)
            .copied()
            .unwrap_or(0))
    }

    async fn credit(&self, owner_id: UserId, amount: i64) -> Result<i64> {
        ensure_positive(amount)?;
        let mut state = self.state.write().await;
        let balance = state.wallets.entry(owner_id).or_insert(0);
        *balance += amount;
        Ok(*balance)
    }

    async fn try_debit(&self, owner_id: UserId, amount: i64) -> Result<bool> {
        ensure_positive(amount)?;
        let mut state = self.state.write().await;
        match state.wallets.get_mut(&owner_id) {
            Some(balance) if *balance >= amount => {
                *balance -= amount;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
