//! Payment service trait and in-memory implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::TransactionId;
use finance::{PaymentOrchestrator, PaymentOutcome, PaymentRequest};
use store::PaymentStore;
use tokio::sync::RwLock;

use crate::error::SagaError;

/// The saga's view of the payment side.
///
/// A request either settles immediately (and `payment.success` is already on
/// the bus) or returns an invoice the sponsor must pay.
#[async_trait]
pub trait PaymentService: Send + Sync {
    async fn request_payment(&self, request: PaymentRequest) -> Result<PaymentOutcome, SagaError>;
}

#[async_trait]
impl<S: PaymentStore> PaymentService for PaymentOrchestrator<S> {
    async fn request_payment(&self, request: PaymentRequest) -> Result<PaymentOutcome, SagaError> {
        PaymentOrchestrator::request_payment(self, request)
            .await
            .map_err(|e| SagaError::PaymentService(e.to_string()))
    }
}

#[async_trait]
impl<T: PaymentService + ?Sized> PaymentService for Arc<T> {
    async fn request_payment(&self, request: PaymentRequest) -> Result<PaymentOutcome, SagaError> {
        (**self).request_payment(request).await
    }
}

/// In-memory payment service for testing.
///
/// Always answers with an invoice and never publishes anything; tests drive the
/// outcome by calling the saga's event handlers directly.
#[derive(Clone, Default)]
pub struct InMemoryPaymentService {
    requests: Arc<RwLock<Vec<PaymentRequest>>>,
    fail_on_request: Arc<AtomicBool>,
}

impl InMemoryPaymentService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent payment requests fail.
    pub fn set_fail_on_request(&self, fail: bool) {
        self.fail_on_request.store(fail, Ordering::SeqCst);
    }

    /// Returns every request received so far.
    pub async fn requests(&self) -> Vec<PaymentRequest> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl PaymentService for InMemoryPaymentService {
    async fn request_payment(&self, request: PaymentRequest) -> Result<PaymentOutcome, SagaError> {
        self.requests.write().await.push(request);

        if self.fail_on_request.load(Ordering::SeqCst) {
            return Err(SagaError::PaymentService(
                "Simulated payment failure".to_string(),
            ));
        }

        let transaction_id = TransactionId::new();
        Ok(PaymentOutcome::PendingInvoice {
            transaction_id,
            payment_url: format!("https://pay.test/{}", transaction_id),
            expires_at: chrono::Utc::now() + chrono::Duration::days(1),
        })
    }
}
