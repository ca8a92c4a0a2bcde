//! HTTP API server for tree adoption.
//!
//! Exposes the catalog, the adoption saga, the payment webhook and the wallet
//! over axum, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::ApiError;
pub use state::{AppState, PaymentBackend, ReservationBackend, build_state};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<R: ReservationBackend, S: PaymentBackend>(
    state: Arc<AppState<R, S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/species", post(routes::catalog::create_species::<R, S>))
        .route("/plots", post(routes::catalog::create_plot::<R, S>))
        .route("/plots/{id}", get(routes::catalog::get_plot::<R, S>))
        .route("/adoptions", post(routes::adoptions::begin::<R, S>))
        .route("/adoptions/{id}", get(routes::adoptions::get::<R, S>))
        .route("/payments/webhook", post(routes::payments::webhook::<R, S>))
        .route(
            "/payments/expiry-check",
            post(routes::payments::expiry_check::<R, S>),
        )
        .route("/wallet/top-up", post(routes::wallet::top_up::<R, S>))
        .route("/wallet/balance", get(routes::wallet::balance::<R, S>))
        .route(
            "/wallet/transactions",
            get(routes::wallet::transactions::<R, S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
