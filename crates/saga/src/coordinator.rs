//! Adoption saga coordinator.

use common::{IntentId, PlotId, SpeciesId, TransactionId, UserId};
use domain::{AdoptionIntent, IntentStatus, LogEntry, Tree};
use finance::{PaymentOutcome, PaymentRequest};
use serde::Serialize;
use store::{CapacityLedger, Reservation, ReservationStore};
use tracing::{error, info, warn};

use crate::error::{Result, SagaError};
use crate::services::payment::PaymentService;
use crate::state::SagaState;

/// Input to [`AdoptionSaga::begin`]. Catalog ids arrive unparsed.
#[derive(Debug, Clone)]
pub struct BeginAdoption {
    pub sponsor_id: UserId,
    pub species_id: String,
    pub plot_id: String,
    pub custom_name: String,
}

/// What the sponsor gets back from a started adoption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdoptionStarted {
    pub intent_id: IntentId,
    /// Absent when the wallet paid immediately.
    pub payment_url: Option<String>,
    /// The payment transaction id.
    pub invoice_id: TransactionId,
}

/// Current view of one adoption.
#[derive(Debug, Clone, Serialize)]
pub struct AdoptionView {
    pub intent: AdoptionIntent,
    pub state: SagaState,
    pub tree: Option<Tree>,
}

/// What an event delivery did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The intent moved to its terminal state and side effects ran.
    Applied,
    /// The intent was already completed but its tree was missing and has now
    /// been created.
    Repaired,
    /// Nothing changed: a duplicate, late or out-of-order delivery.
    Skipped,
}

/// Drives one adoption from reservation to completion or compensation.
///
/// The synchronous part runs inside [`begin`](Self::begin). The rest is
/// driven by `payment.success` and `payment.expired` deliveries, which may be
/// duplicated or reordered; every transition is a compare-and-set on the
/// intent status performed before its side effects.
pub struct AdoptionSaga<R, P>
where
    R: ReservationStore + CapacityLedger,
    P: PaymentService,
{
    store: R,
    payments: P,
}

impl<R, P> AdoptionSaga<R, P>
where
    R: ReservationStore + CapacityLedger,
    P: PaymentService,
{
    pub fn new(store: R, payments: P) -> Self {
        Self { store, payments }
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    /// Reserves capacity, records a pending intent and requests payment.
    ///
    /// If the payment request fails the reservation is released and the intent
    /// marked FAILED before the error is returned.
    #[tracing::instrument(skip(self, request), fields(saga_type = "Adoption", sponsor_id = %request.sponsor_id))]
    pub async fn begin(&self, request: BeginAdoption) -> Result<AdoptionStarted> {
        let species_id: SpeciesId = request
            .species_id
            .parse()
            .map_err(|_| SagaError::InvalidInput(format!("invalid species id: {}", request.species_id)))?;
        let plot_id: PlotId = request
            .plot_id
            .parse()
            .map_err(|_| SagaError::InvalidInput(format!("invalid plot id: {}", request.plot_id)))?;

        let species = self
            .store
            .get_species(species_id)
            .await?
            .ok_or(SagaError::SpeciesNotFound(species_id))?;
        let plot = self
            .store
            .get_plot(plot_id)
            .await?
            .ok_or(SagaError::PlotNotFound(plot_id))?;

        let insufficient = |available| SagaError::InsufficientSpace {
            plot_id,
            available,
            required: species.space_required,
        };
        if !plot.has_room_for(species.space_required) {
            return Err(insufficient(plot.available_capacity));
        }

        // 1. Reserve
        if self.store.reserve(plot_id, species.space_required).await? == Reservation::Insufficient {
            // Another adoption took the room since the read above.
            let available = match self.store.get_plot(plot_id).await? {
                Some(plot) => plot.available_capacity,
                None => 0,
            };
            return Err(insufficient(available));
        }
        info!(state = %SagaState::Reserved, %plot_id, space = species.space_required, "capacity reserved");

        let intent = AdoptionIntent::pending(
            request.sponsor_id,
            species_id,
            plot_id,
            request.custom_name,
        );
        let intent = match self.store.create_intent(intent).await {
            Ok(intent) => intent,
            Err(e) => {
                self.release_capacity(plot_id, species.space_required).await;
                return Err(e.into());
            }
        };
        metrics::counter!("adoptions_started_total").increment(1);

        // 2. Request payment
        let payment = self
            .payments
            .request_payment(PaymentRequest::adopt(
                request.sponsor_id,
                species.price,
                intent.id.to_string(),
            ))
            .await;

        match payment {
            Ok(outcome) => {
                if let PaymentOutcome::Settled { .. } = outcome {
                    info!(intent_id = %intent.id, "adoption paid from wallet");
                }
                info!(intent_id = %intent.id, state = %SagaState::PaymentRequested, "payment requested");
                Ok(AdoptionStarted {
                    intent_id: intent.id,
                    payment_url: outcome.payment_url().map(str::to_string),
                    invoice_id: outcome.transaction_id(),
                })
            }
            Err(e) => {
                warn!(intent_id = %intent.id, error = %e, "payment request failed, compensating");
                self.compensate_failed_request(&intent, species.space_required)
                    .await;
                Err(e)
            }
        }
    }

    /// Completes the adoption named by a `payment.success` reference.
    ///
    /// Idempotent: a duplicate delivery creates no second tree. An intent that
    /// is already COMPLETED but has no tree gets one.
    #[tracing::instrument(skip(self))]
    pub async fn on_payment_success(&self, reference_id: &str) -> Result<EventOutcome> {
        let intent_id = parse_reference(reference_id)?;
        let mut intent = self
            .store
            .get_intent(intent_id)
            .await?
            .ok_or(SagaError::IntentNotFound(intent_id))?;

        let mut completed_now = false;
        if intent.status == IntentStatus::Pending {
            if self
                .store
                .transition_intent(intent_id, IntentStatus::Pending, IntentStatus::Completed)
                .await?
            {
                completed_now = true;
                intent.status = IntentStatus::Completed;
                metrics::counter!("saga_completed").increment(1);
            } else {
                // Lost the race; act on whatever won.
                intent = self
                    .store
                    .get_intent(intent_id)
                    .await?
                    .ok_or(SagaError::IntentNotFound(intent_id))?;
            }
        }

        if intent.status != IntentStatus::Completed {
            warn!(%intent_id, status = %intent.status, "payment succeeded for an adoption that is no longer pending");
            return Ok(EventOutcome::Skipped);
        }

        let tree = Tree::planted_from(&intent);
        if !self.store.create_tree(tree.clone()).await? {
            // A concurrent delivery planted it.
            return Ok(if completed_now {
                EventOutcome::Applied
            } else {
                EventOutcome::Skipped
            });
        }
        self.store.create_log(LogEntry::tree_planted(&tree)).await?;

        if completed_now {
            info!(%intent_id, tree_id = %tree.id, "adoption completed");
            Ok(EventOutcome::Applied)
        } else {
            warn!(%intent_id, tree_id = %tree.id, "created missing tree for completed adoption");
            Ok(EventOutcome::Repaired)
        }
    }

    /// Expires the adoption named by a `payment.expired` reference and returns
    /// its capacity to the plot.
    ///
    /// Only a PENDING intent without a tree is expired.
    #[tracing::instrument(skip(self))]
    pub async fn on_payment_expired(&self, reference_id: &str) -> Result<EventOutcome> {
        let intent_id = parse_reference(reference_id)?;
        let intent = self
            .store
            .get_intent(intent_id)
            .await?
            .ok_or(SagaError::IntentNotFound(intent_id))?;

        if SagaState::from(intent.status).is_terminal() {
            info!(%intent_id, status = %intent.status, "ignoring expiry for settled adoption");
            return Ok(EventOutcome::Skipped);
        }
        if self.store.find_tree_by_intent(intent_id).await?.is_some() {
            warn!(%intent_id, "pending adoption already has a tree, not expiring");
            return Ok(EventOutcome::Skipped);
        }

        let species = self
            .store
            .get_species(intent.species_id)
            .await?
            .ok_or(SagaError::SpeciesNotFound(intent.species_id))?;

        if !self
            .store
            .transition_intent(intent_id, IntentStatus::Pending, IntentStatus::Expired)
            .await?
        {
            return Ok(EventOutcome::Skipped);
        }

        self.store
            .release(intent.plot_id, species.space_required)
            .await?;

        metrics::counter!("saga_expired").increment(1);
        info!(%intent_id, plot_id = %intent.plot_id, space = species.space_required, "adoption expired, capacity released");
        Ok(EventOutcome::Applied)
    }

    /// Returns an adoption with its derived saga state and tree, if any.
    pub async fn get_adoption(&self, intent_id: IntentId) -> Result<AdoptionView> {
        let intent = self
            .store
            .get_intent(intent_id)
            .await?
            .ok_or(SagaError::IntentNotFound(intent_id))?;
        let tree = self.store.find_tree_by_intent(intent_id).await?;

        Ok(AdoptionView {
            state: SagaState::from(intent.status),
            intent,
            tree,
        })
    }

    async fn compensate_failed_request(&self, intent: &AdoptionIntent, space: i64) {
        self.release_capacity(intent.plot_id, space).await;

        match self
            .store
            .transition_intent(intent.id, IntentStatus::Pending, IntentStatus::Failed)
            .await
        {
            Ok(true) => {}
            Ok(false) => warn!(intent_id = %intent.id, "intent left pending before it could be failed"),
            Err(e) => error!(intent_id = %intent.id, error = %e, "failed to mark intent as failed"),
        }

        metrics::counter!("saga_compensated").increment(1);
    }

    async fn release_capacity(&self, plot_id: PlotId, space: i64) {
        if let Err(e) = self.store.release(plot_id, space).await {
            error!(%plot_id, space, error = %e, "failed to release reserved capacity");
        }
    }
}

fn parse_reference(reference_id: &str) -> Result<IntentId> {
    reference_id
        .parse()
        .map_err(|_| SagaError::InvalidInput(format!("invalid adoption reference: {reference_id}")))
}
