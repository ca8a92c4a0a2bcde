//! Saga state machine.

use domain::IntentStatus;
use serde::{Deserialize, Serialize};

/// The state of one adoption attempt.
///
/// State transitions:
/// ```text
/// Reserved ──► PaymentRequested ──┬──► Completed   (payment.success)
///     │                           └──► Expired     (payment.expired)
///     └──► Failed   (payment request failed, capacity released)
/// ```
///
/// `Reserved` only exists inside the synchronous begin step. Afterwards the
/// state is derived from the adoption intent's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SagaState {
    /// Capacity is debited and the intent exists; payment not yet requested.
    Reserved,

    /// Waiting for the payment outcome.
    PaymentRequested,

    /// Tree materialized; the capacity debit is permanent (terminal state).
    Completed,

    /// Payment request failed and capacity was released (terminal state).
    Failed,

    /// Payment lapsed and capacity was released (terminal state).
    Expired,
}

impl SagaState {
    /// Derives the saga state of a persisted intent.
    pub fn from_intent(status: IntentStatus) -> Self {
        match status {
            IntentStatus::Pending => SagaState::PaymentRequested,
            IntentStatus::Completed => SagaState::Completed,
            IntentStatus::Failed => SagaState::Failed,
            IntentStatus::Expired => SagaState::Expired,
        }
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SagaState::Completed | SagaState::Failed | SagaState::Expired
        )
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::Reserved => "RESERVED",
            SagaState::PaymentRequested => "PAYMENT_REQUESTED",
            SagaState::Completed => "COMPLETED",
            SagaState::Failed => "FAILED",
            SagaState::Expired => "EXPIRED",
        }
    }
}

impl From<IntentStatus> for SagaState {
    fn from(status: IntentStatus) -> Self {
        SagaState::from_intent(status)
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
