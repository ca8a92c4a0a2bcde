//! Species and plot administration.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::PlotId;
use domain::{Plot, Species};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::{AppState, PaymentBackend, ReservationBackend};

#[derive(Deserialize)]
pub struct CreateSpeciesRequest {
    pub common_name: String,
    pub space_required: i64,
    pub price: i64,
}

#[derive(Deserialize)]
pub struct CreatePlotRequest {
    pub location_name: String,
    #[serde(default)]
    pub address: String,
    pub total_capacity: i64,
}

fn require_positive(field: &str, value: i64) -> Result<(), ApiError> {
    if value <= 0 {
        return Err(ApiError::BadRequest(format!(
            "{field} must be greater than 0, got {value}"
        )));
    }
    Ok(())
}

fn require_present(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{field} is required")));
    }
    Ok(())
}

/// POST /species
#[tracing::instrument(skip(state, req), fields(common_name = %req.common_name))]
pub async fn create_species<R: ReservationBackend, S: PaymentBackend>(
    State(state): State<Arc<AppState<R, S>>>,
    Json(req): Json<CreateSpeciesRequest>,
) -> Result<(StatusCode, Json<Species>), ApiError> {
    require_present("common_name", &req.common_name)?;
    require_positive("space_required", req.space_required)?;
    require_positive("price", req.price)?;

    let species = state
        .reservations()
        .insert_species(Species::new(req.common_name, req.space_required, req.price))
        .await?;

    Ok((StatusCode::CREATED, Json(species)))
}

/// POST /plots
#[tracing::instrument(skip(state, req), fields(location_name = %req.location_name))]
pub async fn create_plot<R: ReservationBackend, S: PaymentBackend>(
    State(state): State<Arc<AppState<R, S>>>,
    Json(req): Json<CreatePlotRequest>,
) -> Result<(StatusCode, Json<Plot>), ApiError> {
    require_present("location_name", &req.location_name)?;
    require_positive("total_capacity", req.total_capacity)?;

    let plot = state
        .reservations()
        .insert_plot(Plot::new(req.location_name, req.address, req.total_capacity))
        .await?;

    Ok((StatusCode::CREATED, Json(plot)))
}

/// GET /plots/{id}
#[tracing::instrument(skip(state))]
pub async fn get_plot<R: ReservationBackend, S: PaymentBackend>(
    State(state): State<Arc<AppState<R, S>>>,
    Path(id): Path<String>,
) -> Result<Json<Plot>, ApiError> {
    let plot_id: PlotId = id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid plot id: {id}")))?;

    let plot = state
        .reservations()
        .get_plot(plot_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Plot {id} not found")))?;

    Ok(Json(plot))
}
