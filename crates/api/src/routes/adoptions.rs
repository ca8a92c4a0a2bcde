//! Adoption endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::IntentId;
use saga::{AdoptionStarted, AdoptionView, BeginAdoption};
use serde::Deserialize;

use crate::error::ApiError;
use crate::extract::Caller;
use crate::state::{AppState, PaymentBackend, ReservationBackend};

#[derive(Deserialize)]
pub struct AdoptRequest {
    pub species_id: String,
    pub plot_id: String,
    #[serde(default)]
    pub custom_name: String,
}

/// POST /adoptions: starts an adoption for the caller.
///
/// Responds 201 with the payment URL, or without one when the wallet covered
/// the price.
#[tracing::instrument(skip_all, fields(sponsor_id = %sponsor_id))]
pub async fn begin<R: ReservationBackend, S: PaymentBackend>(
    State(state): State<Arc<AppState<R, S>>>,
    Caller(sponsor_id): Caller,
    Json(req): Json<AdoptRequest>,
) -> Result<(StatusCode, Json<AdoptionStarted>), ApiError> {
    let started = state
        .saga
        .begin(BeginAdoption {
            sponsor_id,
            species_id: req.species_id,
            plot_id: req.plot_id,
            custom_name: req.custom_name,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(started)))
}

/// GET /adoptions/{id}
#[tracing::instrument(skip(state))]
pub async fn get<R: ReservationBackend, S: PaymentBackend>(
    State(state): State<Arc<AppState<R, S>>>,
    Path(id): Path<String>,
) -> Result<Json<AdoptionView>, ApiError> {
    let intent_id: IntentId = id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid adoption id: {id}")))?;

    Ok(Json(state.saga.get_adoption(intent_id).await?))
}
