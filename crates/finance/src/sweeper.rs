//! Expiry sweeper.
//!
//! Forces resolution of invoices whose webhook never arrived: every pending
//! transaction past its expiry is marked EXPIRED. ADOPT ones first publish
//! `payment.expired` so the adoption saga compensates exactly as it would for a
//! provider-driven expiry; the expiry handler tolerates the duplicate event a
//! retried pass may send.

use std::sync::Arc;
use std::time::Duration;

use bus::{EventBus, EventBusExt, PAYMENT_EXPIRED, PaymentEvent};
use chrono::{DateTime, Utc};
use domain::PaymentStatus;
use serde::Serialize;
use store::PaymentStore;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::Result;

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Pending transactions found past their expiry.
    pub scanned: usize,
    /// Transactions this pass moved to EXPIRED.
    pub expired: usize,
    /// `payment.expired` events handed to the bus.
    pub published: usize,
    /// Transactions whose publish or update failed; retried on the next pass.
    pub failed: usize,
}

pub struct ExpirySweeper<S: PaymentStore> {
    store: S,
    bus: Arc<dyn EventBus>,
}

impl<S: PaymentStore + 'static> ExpirySweeper<S> {
    pub fn new(store: S, bus: Arc<dyn EventBus>) -> Self {
        Self { store, bus }
    }

    /// Expires every pending transaction whose expiry is before `now`.
    ///
    /// A failure on one transaction is logged and skipped, leaving it pending
    /// for the next pass; only failing to list the batch is an error.
    #[tracing::instrument(skip(self))]
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let stale = self.store.pending_before(now).await?;
        let mut report = SweepReport {
            scanned: stale.len(),
            ..Default::default()
        };

        for tx in stale {
            // ADOPT rows stay PENDING until their expiry event is out, so a
            // failed publish is retried by the next pass.
            if let Some(reference) = tx.adoption_reference() {
                if !self
                    .bus
                    .publish_json(PAYMENT_EXPIRED, &PaymentEvent::new(reference))
                    .await
                {
                    warn!(transaction_id = %tx.id, "expiry event not published, leaving transaction pending");
                    report.failed += 1;
                    continue;
                }
                report.published += 1;
            }

            match self
                .store
                .transition_payment(tx.id, PaymentStatus::Pending, PaymentStatus::Expired)
                .await
            {
                Ok(true) => report.expired += 1,
                // Resolved by a webhook since the listing.
                Ok(false) => {}
                Err(e) => {
                    warn!(transaction_id = %tx.id, error = %e, "failed to expire transaction");
                    report.failed += 1;
                }
            }
        }

        metrics::counter!("payment_sweep_expired_total").increment(report.expired as u64);
        info!(
            scanned = report.scanned,
            expired = report.expired,
            published = report.published,
            failed = report.failed,
            "payment expiry sweep finished"
        );

        Ok(report)
    }

    /// Runs [`sweep_once`](Self::sweep_once) every `period`, first after one
    /// full period.
    pub fn spawn(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                info!("running scheduled payment expiry check");
                if let Err(e) = self.sweep_once(Utc::now()).await {
                    error!(error = %e, "scheduled payment expiry check failed");
                }
            }
        })
    }
}
