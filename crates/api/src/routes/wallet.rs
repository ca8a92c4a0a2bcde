//! Wallet endpoints for the calling user.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{TransactionId, UserId};
use domain::Transaction;
use finance::PaymentOutcome;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::extract::Caller;
use crate::state::{AppState, PaymentBackend, ReservationBackend};

#[derive(Deserialize)]
pub struct TopUpRequest {
    pub amount: i64,
    /// Invoice lifetime; the server default when absent or non-positive.
    pub duration_secs: Option<i64>,
}

#[derive(Serialize)]
pub struct TopUpResponse {
    pub transaction_id: TransactionId,
    pub payment_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub owner_id: UserId,
    pub balance: i64,
}

/// POST /wallet/top-up
#[tracing::instrument(skip_all, fields(owner_id = %owner_id, amount = req.amount))]
pub async fn top_up<R: ReservationBackend, S: PaymentBackend>(
    State(state): State<Arc<AppState<R, S>>>,
    Caller(owner_id): Caller,
    Json(req): Json<TopUpRequest>,
) -> Result<(StatusCode, Json<TopUpResponse>), ApiError> {
    let outcome = state
        .payments
        .top_up(owner_id, req.amount, req.duration_secs)
        .await?;

    let expires_at = match &outcome {
        PaymentOutcome::PendingInvoice { expires_at, .. } => Some(*expires_at),
        PaymentOutcome::Settled { .. } => None,
    };

    Ok((
        StatusCode::CREATED,
        Json(TopUpResponse {
            transaction_id: outcome.transaction_id(),
            payment_url: outcome.payment_url().map(str::to_string),
            expires_at,
        }),
    ))
}

/// GET /wallet/balance
#[tracing::instrument(skip(state))]
pub async fn balance<R: ReservationBackend, S: PaymentBackend>(
    State(state): State<Arc<AppState<R, S>>>,
    Caller(owner_id): Caller,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state.payments.get_balance(owner_id).await?;
    Ok(Json(BalanceResponse { owner_id, balance }))
}

/// GET /wallet/transactions: newest first.
#[tracing::instrument(skip(state))]
pub async fn transactions<R: ReservationBackend, S: PaymentBackend>(
    State(state): State<Arc<AppState<R, S>>>,
    Caller(owner_id): Caller,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    Ok(Json(state.payments.get_history(owner_id).await?))
}
