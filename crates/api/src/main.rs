//! API server entry point.

use std::error::Error;
use std::sync::Arc;

use api::{Config, PaymentBackend, ReservationBackend};
use bus::{AmqpConfig, AmqpEventBus, EventBus, InMemoryEventBus};
use finance::{InMemoryInvoiceProvider, InvoiceClientConfig, InvoiceProvider, XenditInvoiceClient};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::postgres::PgPoolOptions;
use store::{
    InMemoryPaymentStore, InMemoryReservationStore, PostgresPaymentStore,
    PostgresReservationStore,
};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type BoxError = Box<dyn Error + Send + Sync>;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

async fn connect_bus(config: &Config) -> Result<Arc<dyn EventBus>, BoxError> {
    match &config.amqp_url {
        Some(url) => {
            let amqp = AmqpConfig::new(url.clone()).with_exchange(config.event_exchange.clone());
            tracing::info!(exchange = %config.event_exchange, "connecting to RabbitMQ");
            Ok(Arc::new(AmqpEventBus::connect(amqp).await?))
        }
        None => {
            tracing::warn!("AMQP_URL not set, using in-process event bus");
            Ok(Arc::new(InMemoryEventBus::new()))
        }
    }
}

fn invoice_provider(config: &Config) -> Result<Arc<dyn InvoiceProvider>, BoxError> {
    match &config.invoice_api_key {
        Some(key) => {
            let client = XenditInvoiceClient::new(
                InvoiceClientConfig::new(key.clone())
                    .with_base_url(config.invoice_base_url.clone())
                    .with_timeout(config.invoice_timeout)
                    .with_currency(config.invoice_currency.clone()),
            )?;
            Ok(Arc::new(client))
        }
        None => {
            tracing::warn!("INVOICE_API_KEY not set, using local invoice provider");
            Ok(Arc::new(InMemoryInvoiceProvider::new()))
        }
    }
}

async fn serve<R, S>(
    config: Config,
    reservations: R,
    payments: S,
    metrics_handle: PrometheusHandle,
) -> Result<(), BoxError>
where
    R: ReservationBackend,
    S: PaymentBackend + Clone,
{
    let bus = connect_bus(&config).await?;
    let invoices = invoice_provider(&config)?;
    let state = api::build_state(reservations, payments, invoices, bus, &config).await?;

    let sweeper = state.sweeper.clone().spawn(config.sweep_interval);
    tracing::info!(interval_secs = config.sweep_interval.as_secs(), "payment expiry sweeper scheduled");

    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    tracing::info!("server shut down gracefully");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    // 3. Pick storage and serve
    match config.database_url.clone() {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(&url)
                .await?;
            let reservations = PostgresReservationStore::new(pool.clone());
            reservations.run_migrations().await?;
            tracing::info!("connected to PostgreSQL, migrations applied");

            serve(
                config,
                reservations,
                PostgresPaymentStore::new(pool),
                metrics_handle,
            )
            .await
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory stores");
            serve(
                config,
                InMemoryReservationStore::new(),
                InMemoryPaymentStore::new(),
                metrics_handle,
            )
            .await
        }
    }
}
