//! Payment provider callbacks and operator triggers.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use chrono::Utc;
use finance::{SweepReport, WebhookOutcome};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::{AppState, PaymentBackend, ReservationBackend};

/// Header the provider signs its callbacks with.
pub const CALLBACK_TOKEN_HEADER: &str = "x-callback-token";

#[derive(Serialize)]
pub struct WebhookResponse {
    pub outcome: &'static str,
}

fn outcome_name(outcome: WebhookOutcome) -> &'static str {
    match outcome {
        WebhookOutcome::Settled => "settled",
        WebhookOutcome::Expired => "expired",
        WebhookOutcome::Unchanged => "unchanged",
        WebhookOutcome::Ignored => "ignored",
    }
}

/// POST /payments/webhook
#[tracing::instrument(skip_all)]
pub async fn webhook<R: ReservationBackend, S: PaymentBackend>(
    State(state): State<Arc<AppState<R, S>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    if let Some(expected) = &state.webhook_token {
        let presented = headers
            .get(CALLBACK_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());
        if presented != Some(expected.as_str()) {
            tracing::warn!("rejected webhook with missing or wrong callback token");
            return Err(ApiError::Unauthorized("invalid callback token".to_string()));
        }
    }

    let outcome = state.payments.handle_webhook(&body).await?;
    Ok(Json(WebhookResponse {
        outcome: outcome_name(outcome),
    }))
}

/// POST /payments/expiry-check: runs one expiry sweep now.
#[tracing::instrument(skip(state))]
pub async fn expiry_check<R: ReservationBackend, S: PaymentBackend>(
    State(state): State<Arc<AppState<R, S>>>,
) -> Result<Json<SweepReport>, ApiError> {
    Ok(Json(state.sweeper.sweep_once(Utc::now()).await?))
}
