//! Payment orchestrator.
//!
//! Settles ADOPT payments from the owner's wallet when it covers the amount and
//! otherwise hands out an external invoice. Asynchronous outcomes arrive through
//! the provider webhook; ADOPT outcomes are republished on the bus for the
//! adoption saga, DEPOSIT settlements credit the wallet directly.

use std::sync::Arc;

use bus::{EventBus, EventBusExt, PAYMENT_EXPIRED, PAYMENT_SUCCESS, PaymentEvent};
use chrono::{DateTime, TimeDelta, Utc};
use common::{TransactionId, UserId};
use domain::{PaymentStatus, Transaction, TransactionKind};
use serde::Deserialize;
use store::PaymentStore;
use tracing::{debug, info, warn};

use crate::invoice::{InvoiceProvider, InvoiceRequest};
use crate::{FinanceError, Result};

/// Invoice lifetime used when the caller gives none or a non-positive one.
pub const DEFAULT_INVOICE_DURATION_SECS: i64 = 86_400;

/// Longest invoice lifetime a caller may ask for (one year).
pub const MAX_INVOICE_DURATION_SECS: i64 = 31_536_000;

/// A request for money from an owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub owner_id: UserId,
    pub amount: i64,
    pub kind: TransactionKind,
    /// For ADOPT payments, the adoption intent id.
    pub reference_id: Option<String>,
    /// Invoice lifetime hint in seconds.
    pub duration_secs: Option<i64>,
}

impl PaymentRequest {
    pub fn adopt(owner_id: UserId, amount: i64, reference_id: impl Into<String>) -> Self {
        Self {
            owner_id,
            amount,
            kind: TransactionKind::Adopt,
            reference_id: Some(reference_id.into()),
            duration_secs: None,
        }
    }

    pub fn deposit(owner_id: UserId, amount: i64, duration_secs: Option<i64>) -> Self {
        Self {
            owner_id,
            amount,
            kind: TransactionKind::Deposit,
            reference_id: None,
            duration_secs,
        }
    }
}

/// How a payment request was answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// Paid from the wallet; `payment.success` has already been published.
    Settled { transaction_id: TransactionId },
    /// The owner must pay the invoice at `payment_url` before `expires_at`.
    PendingInvoice {
        transaction_id: TransactionId,
        payment_url: String,
        expires_at: DateTime<Utc>,
    },
}

impl PaymentOutcome {
    /// The transaction id, which doubles as the invoice's external id.
    pub fn transaction_id(&self) -> TransactionId {
        match self {
            PaymentOutcome::Settled { transaction_id }
            | PaymentOutcome::PendingInvoice { transaction_id, .. } => *transaction_id,
        }
    }

    pub fn payment_url(&self) -> Option<&str> {
        match self {
            PaymentOutcome::Settled { .. } => None,
            PaymentOutcome::PendingInvoice { payment_url, .. } => Some(payment_url),
        }
    }
}

/// What a webhook delivery changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The transaction moved to SUCCESS.
    Settled,
    /// The transaction moved to EXPIRED.
    Expired,
    /// The transaction was already in a state the notice cannot change.
    Unchanged,
    /// The notice carried a status we do not act on.
    Ignored,
}

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    #[serde(default)]
    external_id: String,
    #[serde(default)]
    status: String,
}

/// Payment orchestrator over a payment store, an invoice provider, and the bus.
pub struct PaymentOrchestrator<S: PaymentStore> {
    store: S,
    invoices: Arc<dyn InvoiceProvider>,
    bus: Arc<dyn EventBus>,
    default_duration_secs: i64,
}

impl<S: PaymentStore> PaymentOrchestrator<S> {
    pub fn new(store: S, invoices: Arc<dyn InvoiceProvider>, bus: Arc<dyn EventBus>) -> Self {
        Self {
            store,
            invoices,
            bus,
            default_duration_secs: DEFAULT_INVOICE_DURATION_SECS,
        }
    }

    /// Overrides the invoice lifetime used when a request gives none.
    pub fn with_default_duration(mut self, secs: i64) -> Self {
        if (1..=MAX_INVOICE_DURATION_SECS).contains(&secs) {
            self.default_duration_secs = secs;
        }
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Answers a payment request, from the wallet if possible.
    ///
    /// Only ADOPT payments take the wallet fast path. An invoice failure is an
    /// error for the whole request; the pending transaction is left for the
    /// expiry sweeper.
    #[tracing::instrument(skip(self, request), fields(owner_id = %request.owner_id, kind = %request.kind, amount = request.amount))]
    pub async fn request_payment(&self, request: PaymentRequest) -> Result<PaymentOutcome> {
        if request.amount <= 0 {
            return Err(FinanceError::InvalidInput(format!(
                "amount must be greater than 0, got {}",
                request.amount
            )));
        }

        if request.kind == TransactionKind::Adopt
            && let Some(transaction_id) = self.try_settle_from_wallet(&request).await?
        {
            return Ok(PaymentOutcome::Settled { transaction_id });
        }

        self.create_invoice_transaction(request).await
    }

    /// Starts a wallet top-up: always an invoice, credited on settlement.
    pub async fn top_up(
        &self,
        owner_id: UserId,
        amount: i64,
        duration_secs: Option<i64>,
    ) -> Result<PaymentOutcome> {
        self.request_payment(PaymentRequest::deposit(owner_id, amount, duration_secs))
            .await
    }

    async fn try_settle_from_wallet(
        &self,
        request: &PaymentRequest,
    ) -> Result<Option<TransactionId>> {
        let balance = self.store.balance(request.owner_id).await?;
        debug!(balance, required = request.amount, "checked wallet balance");
        if balance < request.amount {
            return Ok(None);
        }

        // A concurrent debit may have drained the wallet since the read.
        if !self.store.try_debit(request.owner_id, request.amount).await? {
            debug!("wallet debit lost a race, falling back to invoice");
            return Ok(None);
        }

        let tx = Transaction::settled(
            request.owner_id,
            request.amount,
            request.kind,
            request.reference_id.clone(),
        );
        let tx = match self.store.create_transaction(tx).await {
            Ok(tx) => tx,
            Err(e) => {
                if let Err(refund) = self.store.credit(request.owner_id, request.amount).await {
                    warn!(error = %refund, "failed to refund wallet after transaction write failed");
                }
                return Err(e.into());
            }
        };

        metrics::counter!("payments_settled_total", "kind" => tx.kind.as_str(), "path" => "wallet")
            .increment(1);
        info!(transaction_id = %tx.id, "payment settled from wallet");

        if let Some(reference) = tx.adoption_reference() {
            self.bus
                .publish_json(PAYMENT_SUCCESS, &PaymentEvent::new(reference))
                .await;
        }

        Ok(Some(tx.id))
    }

    async fn create_invoice_transaction(&self, request: PaymentRequest) -> Result<PaymentOutcome> {
        let duration_secs = request
            .duration_secs
            .filter(|secs| *secs > 0)
            .unwrap_or(self.default_duration_secs);
        let fallback_expiry = expiry_after(Utc::now(), duration_secs)?;

        let tx = self
            .store
            .create_transaction(Transaction::pending(
                request.owner_id,
                request.amount,
                request.kind,
                request.reference_id,
                fallback_expiry,
            ))
            .await?;

        let invoice = self
            .invoices
            .create_invoice(&InvoiceRequest {
                external_id: tx.id.to_string(),
                amount: tx.amount,
                description: format!("{} - User {}", tx.kind, tx.owner_id),
                duration_secs,
            })
            .await?;

        let expires_at = parse_expiry(invoice.expiry_date.as_deref(), fallback_expiry);
        self.store
            .update_invoice_details(tx.id, &invoice.invoice_url, expires_at)
            .await?;

        info!(transaction_id = %tx.id, %expires_at, "invoice created");

        Ok(PaymentOutcome::PendingInvoice {
            transaction_id: tx.id,
            payment_url: invoice.invoice_url,
            expires_at,
        })
    }

    /// Applies a provider webhook body.
    ///
    /// `PAID`/`SETTLED` settle the transaction, `EXPIRED` expires it, anything
    /// else is ignored. Redelivery of a notice is a no-op.
    #[tracing::instrument(skip(self, body))]
    pub async fn handle_webhook(&self, body: &[u8]) -> Result<WebhookOutcome> {
        let payload: WebhookPayload = serde_json::from_slice(body)
            .map_err(|e| FinanceError::InvalidWebhook(format!("failed to parse body: {}", e)))?;

        if payload.external_id.is_empty() {
            return Err(FinanceError::InvalidWebhook(
                "external_id is required".to_string(),
            ));
        }
        let id: TransactionId = payload.external_id.parse().map_err(|_| {
            FinanceError::InvalidWebhook(format!(
                "invalid external_id format: {}",
                payload.external_id
            ))
        })?;

        match payload.status.as_str() {
            "PAID" | "SETTLED" => self.settle(id).await,
            "EXPIRED" => self.expire(id).await,
            other => {
                debug!(transaction_id = %id, status = other, "ignoring webhook status");
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    async fn load(&self, id: TransactionId) -> Result<Transaction> {
        self.store
            .get_transaction(id)
            .await?
            .ok_or(FinanceError::TransactionNotFound(id))
    }

    async fn settle(&self, id: TransactionId) -> Result<WebhookOutcome> {
        // Statuses only move forward, so this converges within two rounds.
        let tx = loop {
            let tx = self.load(id).await?;
            if tx.status == PaymentStatus::Success {
                debug!(transaction_id = %id, "transaction already settled");
                return Ok(WebhookOutcome::Unchanged);
            }
            if self
                .store
                .transition_payment(id, tx.status, PaymentStatus::Success)
                .await?
            {
                break tx;
            }
        };

        metrics::counter!("payments_settled_total", "kind" => tx.kind.as_str(), "path" => "invoice")
            .increment(1);
        info!(transaction_id = %id, previous = %tx.status, "payment settled by provider");

        match tx.kind {
            TransactionKind::Adopt => match tx.adoption_reference() {
                Some(reference) => {
                    self.bus
                        .publish_json(PAYMENT_SUCCESS, &PaymentEvent::new(reference))
                        .await;
                }
                None => warn!(transaction_id = %id, "settled ADOPT transaction has no reference"),
            },
            TransactionKind::Deposit => {
                let balance = self.store.credit(tx.owner_id, tx.amount).await?;
                info!(owner_id = %tx.owner_id, balance, "wallet credited");
            }
        }

        Ok(WebhookOutcome::Settled)
    }

    async fn expire(&self, id: TransactionId) -> Result<WebhookOutcome> {
        let tx = self.load(id).await?;
        if tx.status != PaymentStatus::Pending {
            debug!(transaction_id = %id, status = %tx.status, "expiry notice for resolved transaction");
            return Ok(WebhookOutcome::Unchanged);
        }

        if !self
            .store
            .transition_payment(id, PaymentStatus::Pending, PaymentStatus::Expired)
            .await?
        {
            return Ok(WebhookOutcome::Unchanged);
        }

        info!(transaction_id = %id, "payment expired by provider");
        if let Some(reference) = tx.adoption_reference() {
            self.bus
                .publish_json(PAYMENT_EXPIRED, &PaymentEvent::new(reference))
                .await;
        }

        Ok(WebhookOutcome::Expired)
    }

    pub async fn get_balance(&self, owner_id: UserId) -> Result<i64> {
        Ok(self.store.balance(owner_id).await?)
    }

    /// Returns the owner's transactions, newest first.
    pub async fn get_history(&self, owner_id: UserId) -> Result<Vec<Transaction>> {
        Ok(self.store.transactions_for(owner_id).await?)
    }
}

/// Returns `now + duration_secs`, rejecting lifetimes past the maximum.
fn expiry_after(now: DateTime<Utc>, duration_secs: i64) -> Result<DateTime<Utc>> {
    if duration_secs > MAX_INVOICE_DURATION_SECS {
        return Err(FinanceError::InvalidInput(format!(
            "duration_secs must be at most {}, got {}",
            MAX_INVOICE_DURATION_SECS, duration_secs
        )));
    }
    TimeDelta::try_seconds(duration_secs)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| {
            FinanceError::InvalidInput(format!("duration_secs out of range: {}", duration_secs))
        })
}

fn parse_expiry(raw: Option<&str>, fallback: DateTime<Utc>) -> DateTime<Utc> {
    match raw.map(DateTime::parse_from_rfc3339) {
        Some(Ok(parsed)) => parsed.with_timezone(&Utc),
        Some(Err(e)) => {
            warn!(error = %e, "unparseable invoice expiry, using requested duration");
            fallback
        }
        None => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::InMemoryInvoiceProvider;
    use bus::InMemoryEventBus;
    use chrono::Duration;
    use store::InMemoryPaymentStore;

    struct Harness {
        orchestrator: PaymentOrchestrator<InMemoryPaymentStore>,
        store: InMemoryPaymentStore,
        invoices: InMemoryInvoiceProvider,
        bus: InMemoryEventBus,
    }

    fn harness() -> Harness {
        let store = InMemoryPaymentStore::new();
        let invoices = InMemoryInvoiceProvider::new();
        let bus = InMemoryEventBus::new();
        let orchestrator = PaymentOrchestrator::new(
            store.clone(),
            Arc::new(invoices.clone()),
            Arc::new(bus.clone()),
        );
        Harness {
            orchestrator,
            store,
            invoices,
            bus,
        }
    }

    fn webhook(id: TransactionId, status: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "id": "provider-invoice-id",
            "external_id": id.to_string(),
            "status": status,
            "amount": 50,
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_expiry_falls_back() {
        let fallback = Utc::now();
        let parsed = parse_expiry(Some("2030-01-01T00:00:00Z"), fallback);
        assert_eq!(parsed.to_rfc3339(), "2030-01-01T00:00:00+00:00");
        assert_eq!(parse_expiry(Some("tomorrow"), fallback), fallback);
        assert_eq!(parse_expiry(None, fallback), fallback);
    }

    #[tokio::test]
    async fn test_adopt_settles_from_wallet() {
        let h = harness();
        let owner = UserId::new();
        h.store.set_balance(owner, 100).await;

        let outcome = h
            .orchestrator
            .request_payment(PaymentRequest::adopt(owner, 50, "intent-1"))
            .await
            .unwrap();

        assert!(matches!(outcome, PaymentOutcome::Settled { .. }));
        assert_eq!(outcome.payment_url(), None);
        assert_eq!(h.store.balance(owner).await.unwrap(), 50);
        assert!(h.invoices.requests().await.is_empty());

        let published = h.bus.published_on(PAYMENT_SUCCESS).await;
        assert_eq!(published.len(), 1);
        assert_eq!(
            published[0].payload,
            br#"{"reference_id":"intent-1"}"#.to_vec()
        );

        let tx = h
            .store
            .get_transaction(outcome.transaction_id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tx.status, PaymentStatus::Success);
    }

    #[tokio::test]
    async fn test_adopt_without_cover_creates_invoice() {
        let h = harness();
        let owner = UserId::new();
        h.store.set_balance(owner, 10).await;

        let outcome = h
            .orchestrator
            .request_payment(PaymentRequest::adopt(owner, 50, "intent-1"))
            .await
            .unwrap();

        let PaymentOutcome::PendingInvoice {
            transaction_id,
            payment_url,
            ..
        } = &outcome
        else {
            panic!("expected invoice, got {:?}", outcome);
        };
        assert_eq!(
            payment_url,
            &InMemoryInvoiceProvider::checkout_url(&transaction_id.to_string())
        );
        assert_eq!(h.store.balance(owner).await.unwrap(), 10);

        let requests = h.invoices.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].duration_secs, DEFAULT_INVOICE_DURATION_SECS);
        assert_eq!(requests[0].description, format!("ADOPT - User {}", owner));

        let tx = h
            .store
            .get_transaction(*transaction_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tx.status, PaymentStatus::Pending);
        assert_eq!(tx.payment_url.as_deref(), Some(payment_url.as_str()));
        assert!(h.bus.published().await.is_empty());
    }

    #[tokio::test]
    async fn test_deposit_never_uses_wallet() {
        let h = harness();
        let owner = UserId::new();
        h.store.set_balance(owner, 1_000).await;

        let outcome = h.orchestrator.top_up(owner, 50, Some(600)).await.unwrap();

        assert!(matches!(outcome, PaymentOutcome::PendingInvoice { .. }));
        assert_eq!(h.invoices.requests().await[0].duration_secs, 600);
        assert_eq!(h.store.balance(owner).await.unwrap(), 1_000);
    }

    #[tokio::test]
    async fn test_non_positive_amount_is_rejected() {
        let h = harness();
        let result = h.orchestrator.top_up(UserId::new(), 0, None).await;
        assert!(matches!(result, Err(FinanceError::InvalidInput(_))));
        assert_eq!(h.store.transaction_count().await, 0);
    }

    #[tokio::test]
    async fn test_oversized_duration_is_rejected() {
        let h = harness();

        for secs in [i64::MAX, MAX_INVOICE_DURATION_SECS + 1] {
            let result = h.orchestrator.top_up(UserId::new(), 50, Some(secs)).await;
            assert!(matches!(result, Err(FinanceError::InvalidInput(_))));
        }
        assert_eq!(h.store.transaction_count().await, 0);
        assert!(h.invoices.requests().await.is_empty());

        let outcome = h
            .orchestrator
            .top_up(UserId::new(), 50, Some(MAX_INVOICE_DURATION_SECS))
            .await
            .unwrap();
        assert!(matches!(outcome, PaymentOutcome::PendingInvoice { .. }));
    }

    #[test]
    fn test_default_duration_ignores_out_of_range_values() {
        let h = harness();
        let orchestrator = h.orchestrator.with_default_duration(i64::MAX);
        assert_eq!(orchestrator.default_duration_secs, DEFAULT_INVOICE_DURATION_SECS);
    }

    #[tokio::test]
    async fn test_invoice_failure_leaves_pending_transaction() {
        let h = harness();
        h.invoices.set_fail(true);

        let result = h.orchestrator.top_up(UserId::new(), 50, None).await;

        assert!(matches!(result, Err(FinanceError::Invoice(_))));
        assert_eq!(h.store.transaction_count().await, 1);
        let pending = h
            .store
            .pending_before(Utc::now() + Duration::days(2))
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_provider_expiry_uses_duration() {
        let h = harness();
        h.invoices.set_expiry_date(Some("not a date".to_string())).await;

        let before = Utc::now();
        let outcome = h.orchestrator.top_up(UserId::new(), 50, Some(60)).await.unwrap();

        let PaymentOutcome::PendingInvoice { expires_at, .. } = outcome else {
            panic!("expected invoice");
        };
        assert!(expires_at >= before + Duration::seconds(60));
        assert!(expires_at <= Utc::now() + Duration::seconds(60));
    }

    #[tokio::test]
    async fn test_paid_webhook_publishes_success_once() {
        let h = harness();
        let outcome = h
            .orchestrator
            .request_payment(PaymentRequest::adopt(UserId::new(), 50, "intent-1"))
            .await
            .unwrap();
        let id = outcome.transaction_id();

        let first = h.orchestrator.handle_webhook(&webhook(id, "PAID")).await.unwrap();
        let second = h
            .orchestrator
            .handle_webhook(&webhook(id, "SETTLED"))
            .await
            .unwrap();

        assert_eq!(first, WebhookOutcome::Settled);
        assert_eq!(second, WebhookOutcome::Unchanged);
        assert_eq!(h.bus.published_on(PAYMENT_SUCCESS).await.len(), 1);
    }

    #[tokio::test]
    async fn test_paid_deposit_credits_wallet() {
        let h = harness();
        let owner = UserId::new();
        let outcome = h.orchestrator.top_up(owner, 75, None).await.unwrap();

        h.orchestrator
            .handle_webhook(&webhook(outcome.transaction_id(), "PAID"))
            .await
            .unwrap();
        h.orchestrator
            .handle_webhook(&webhook(outcome.transaction_id(), "PAID"))
            .await
            .unwrap();

        assert_eq!(h.orchestrator.get_balance(owner).await.unwrap(), 75);
        assert!(h.bus.published().await.is_empty());
    }

    #[tokio::test]
    async fn test_expired_webhook_publishes_expiry_for_adopt() {
        let h = harness();
        let outcome = h
            .orchestrator
            .request_payment(PaymentRequest::adopt(UserId::new(), 50, "intent-9"))
            .await
            .unwrap();
        let id = outcome.transaction_id();

        let result = h
            .orchestrator
            .handle_webhook(&webhook(id, "EXPIRED"))
            .await
            .unwrap();
        assert_eq!(result, WebhookOutcome::Expired);

        let again = h
            .orchestrator
            .handle_webhook(&webhook(id, "EXPIRED"))
            .await
            .unwrap();
        assert_eq!(again, WebhookOutcome::Unchanged);

        let published = h.bus.published_on(PAYMENT_EXPIRED).await;
        assert_eq!(published.len(), 1);
        assert_eq!(
            published[0].payload,
            br#"{"reference_id":"intent-9"}"#.to_vec()
        );
    }

    #[tokio::test]
    async fn test_expired_after_success_is_a_no_op() {
        let h = harness();
        let outcome = h.orchestrator.top_up(UserId::new(), 50, None).await.unwrap();
        let id = outcome.transaction_id();

        h.orchestrator.handle_webhook(&webhook(id, "PAID")).await.unwrap();
        let result = h
            .orchestrator
            .handle_webhook(&webhook(id, "EXPIRED"))
            .await
            .unwrap();

        assert_eq!(result, WebhookOutcome::Unchanged);
        let tx = h.store.get_transaction(id).await.unwrap().unwrap();
        assert_eq!(tx.status, PaymentStatus::Success);
    }

    #[tokio::test]
    async fn test_paid_after_expiry_records_settlement() {
        let h = harness();
        let outcome = h
            .orchestrator
            .request_payment(PaymentRequest::adopt(UserId::new(), 50, "intent-3"))
            .await
            .unwrap();
        let id = outcome.transaction_id();

        h.orchestrator.handle_webhook(&webhook(id, "EXPIRED")).await.unwrap();
        let result = h.orchestrator.handle_webhook(&webhook(id, "PAID")).await.unwrap();

        assert_eq!(result, WebhookOutcome::Settled);
        assert_eq!(h.bus.published_on(PAYMENT_SUCCESS).await.len(), 1);
    }

    #[tokio::test]
    async fn test_webhook_validation() {
        let h = harness();

        let missing = h
            .orchestrator
            .handle_webhook(br#"{"status":"PAID"}"#)
            .await;
        assert!(matches!(missing, Err(FinanceError::InvalidWebhook(_))));

        let malformed = h
            .orchestrator
            .handle_webhook(br#"{"external_id":"nope","status":"PAID"}"#)
            .await;
        assert!(matches!(malformed, Err(FinanceError::InvalidWebhook(_))));

        let garbage = h.orchestrator.handle_webhook(b"not json").await;
        assert!(matches!(garbage, Err(FinanceError::InvalidWebhook(_))));

        let unknown = h
            .orchestrator
            .handle_webhook(&webhook(TransactionId::new(), "PAID"))
            .await;
        assert!(matches!(unknown, Err(FinanceError::TransactionNotFound(_))));

        let ignored = h
            .orchestrator
            .handle_webhook(&webhook(TransactionId::new(), "PENDING"))
            .await
            .unwrap();
        assert_eq!(ignored, WebhookOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_history_is_newest_first() {
        let h = harness();
        let owner = UserId::new();
        let first = h.orchestrator.top_up(owner, 10, None).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = h.orchestrator.top_up(owner, 20, None).await.unwrap();

        let history = h.orchestrator.get_history(owner).await.unwrap();
        assert_eq!(
            history.iter().map(|tx| tx.id).collect::<Vec<_>>(),
            vec![second.transaction_id(), first.transaction_id()]
        );
    }
}
