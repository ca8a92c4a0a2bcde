//! Shared application state and its construction.

use std::sync::Arc;

use bus::EventBus;
use finance::{ExpirySweeper, InvoiceProvider, PaymentOrchestrator};
use saga::{AdoptionSaga, SagaError};
use store::{CapacityLedger, PaymentStore, ReservationStore};

use crate::config::Config;

/// Reservation-side storage the server can run on.
pub trait ReservationBackend: ReservationStore + CapacityLedger + 'static {}

impl<T: ReservationStore + CapacityLedger + 'static> ReservationBackend for T {}

/// Payment-side storage the server can run on.
pub trait PaymentBackend: PaymentStore + 'static {}

impl<T: PaymentStore + 'static> PaymentBackend for T {}

pub type Saga<R, S> = AdoptionSaga<R, Arc<PaymentOrchestrator<S>>>;

/// Shared application state accessible from all handlers.
pub struct AppState<R: ReservationBackend, S: PaymentBackend> {
    pub saga: Arc<Saga<R, S>>,
    pub payments: Arc<PaymentOrchestrator<S>>,
    pub sweeper: Arc<ExpirySweeper<S>>,
    pub webhook_token: Option<String>,
}

impl<R: ReservationBackend, S: PaymentBackend> AppState<R, S> {
    pub fn reservations(&self) -> &R {
        self.saga.store()
    }
}

/// Wires the orchestrator, saga and sweeper over the given backends and
/// subscribes the saga to payment outcomes on `bus`.
pub async fn build_state<R, S>(
    reservations: R,
    payments: S,
    invoices: Arc<dyn InvoiceProvider>,
    bus: Arc<dyn EventBus>,
    config: &Config,
) -> Result<Arc<AppState<R, S>>, SagaError>
where
    R: ReservationBackend,
    S: PaymentBackend + Clone,
{
    let orchestrator = Arc::new(
        PaymentOrchestrator::new(payments.clone(), invoices, bus.clone())
            .with_default_duration(config.invoice_duration_secs),
    );
    let saga = Arc::new(AdoptionSaga::new(reservations, orchestrator.clone()));
    saga::start_consumers(saga.clone(), bus.as_ref()).await?;

    Ok(Arc::new(AppState {
        saga,
        payments: orchestrator,
        sweeper: Arc::new(ExpirySweeper::new(payments, bus)),
        webhook_token: config.webhook_callback_token.clone(),
    }))
}
