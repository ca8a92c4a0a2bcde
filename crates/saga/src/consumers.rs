//! Bus consumers that drive the adoption saga forward.

use std::sync::Arc;

use async_trait::async_trait;
use bus::{EventBus, EventHandler, HandlerError, PAYMENT_EXPIRED, PAYMENT_SUCCESS, PaymentEvent};
use store::{CapacityLedger, ReservationStore};
use tracing::debug;

use crate::coordinator::AdoptionSaga;
use crate::error::Result;
use crate::services::payment::PaymentService;

/// Completes adoptions on `payment.success`.
pub struct PaymentSucceededHandler<R, P>
where
    R: ReservationStore + CapacityLedger,
    P: PaymentService,
{
    saga: Arc<AdoptionSaga<R, P>>,
}

/// Compensates adoptions on `payment.expired`.
pub struct PaymentExpiredHandler<R, P>
where
    R: ReservationStore + CapacityLedger,
    P: PaymentService,
{
    saga: Arc<AdoptionSaga<R, P>>,
}

fn decode(payload: &[u8]) -> std::result::Result<PaymentEvent, HandlerError> {
    Ok(serde_json::from_slice(payload)?)
}

#[async_trait]
impl<R, P> EventHandler for PaymentSucceededHandler<R, P>
where
    R: ReservationStore + CapacityLedger + 'static,
    P: PaymentService + 'static,
{
    fn name(&self) -> &'static str {
        "adoption.payment-success"
    }

    async fn handle(&self, payload: &[u8]) -> std::result::Result<(), HandlerError> {
        let event = decode(payload)?;
        let outcome = self.saga.on_payment_success(&event.reference_id).await?;
        debug!(reference_id = %event.reference_id, ?outcome, "payment success handled");
        Ok(())
    }
}

#[async_trait]
impl<R, P> EventHandler for PaymentExpiredHandler<R, P>
where
    R: ReservationStore + CapacityLedger + 'static,
    P: PaymentService + 'static,
{
    fn name(&self) -> &'static str {
        "adoption.payment-expired"
    }

    async fn handle(&self, payload: &[u8]) -> std::result::Result<(), HandlerError> {
        let event = decode(payload)?;
        let outcome = self.saga.on_payment_expired(&event.reference_id).await?;
        debug!(reference_id = %event.reference_id, ?outcome, "payment expiry handled");
        Ok(())
    }
}

/// Subscribes the saga to both payment outcomes.
pub async fn start_consumers<R, P>(saga: Arc<AdoptionSaga<R, P>>, bus: &dyn EventBus) -> Result<()>
where
    R: ReservationStore + CapacityLedger + 'static,
    P: PaymentService + 'static,
{
    bus.subscribe(
        PAYMENT_SUCCESS,
        Arc::new(PaymentSucceededHandler { saga: saga.clone() }),
    )
    .await?;
    bus.subscribe(PAYMENT_EXPIRED, Arc::new(PaymentExpiredHandler { saga }))
        .await?;
    Ok(())
}
