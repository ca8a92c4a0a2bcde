//! Integration tests for the API server on in-memory backends.

use std::sync::{Arc, OnceLock};

use api::Config;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use bus::InMemoryEventBus;
use common::UserId;
use finance::InMemoryInvoiceProvider;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use store::{InMemoryPaymentStore, InMemoryReservationStore};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    router: Router,
    payments: InMemoryPaymentStore,
    invoices: InMemoryInvoiceProvider,
    bus: InMemoryEventBus,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    async fn with_config(config: Config) -> Self {
        let payments = InMemoryPaymentStore::new();
        let invoices = InMemoryInvoiceProvider::new();
        let bus = InMemoryEventBus::new();
        let state = api::build_state(
            InMemoryReservationStore::new(),
            payments.clone(),
            Arc::new(invoices.clone()),
            Arc::new(bus.clone()),
            &config,
        )
        .await
        .unwrap();

        Self {
            router: api::create_app(state, get_metrics_handle()),
            payments,
            invoices,
            bus,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn get(&self, uri: &str, user: Option<UserId>) -> (StatusCode, Value) {
        let mut builder = Request::builder().uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-user-id", user.to_string());
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post(&self, uri: &str, user: Option<UserId>, body: Value) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(user) = user {
            builder = builder.header("x-user-id", user.to_string());
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Creates a 10-unit plot and a species needing 4 units at price 50.
    async fn seed_catalog(&self) -> (String, String) {
        let (status, species) = self
            .post(
                "/species",
                None,
                json!({"common_name": "Mahogany", "space_required": 4, "price": 50}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, plot) = self
            .post(
                "/plots",
                None,
                json!({"location_name": "North Ridge", "address": "Jl. Hutan 1", "total_capacity": 10}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        (
            species["id"].as_str().unwrap().to_string(),
            plot["id"].as_str().unwrap().to_string(),
        )
    }

    async fn available(&self, plot_id: &str) -> i64 {
        let (_, plot) = self.get(&format!("/plots/{plot_id}"), None).await;
        plot["available_capacity"].as_i64().unwrap()
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;

    let (status, json) = app.get("/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = TestApp::new().await;

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_catalog_validation() {
    let app = TestApp::new().await;

    let (status, _) = app
        .post(
            "/species",
            None,
            json!({"common_name": "Teak", "space_required": 0, "price": 10}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/plots/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .get(&format!("/plots/{}", common::PlotId::new()), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_adoption_paid_by_invoice() {
    let app = TestApp::new().await;
    let (species_id, plot_id) = app.seed_catalog().await;
    let sponsor = UserId::new();

    let (status, started) = app
        .post(
            "/adoptions",
            Some(sponsor),
            json!({"species_id": species_id, "plot_id": plot_id, "custom_name": "Bob"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(started["payment_url"].as_str().is_some());
    assert_eq!(app.available(&plot_id).await, 6);

    let intent_id = started["intent_id"].as_str().unwrap().to_string();
    let (_, view) = app.get(&format!("/adoptions/{intent_id}"), None).await;
    assert_eq!(view["state"], "PAYMENT_REQUESTED");

    let (status, outcome) = app
        .post(
            "/payments/webhook",
            None,
            json!({"external_id": started["invoice_id"], "status": "PAID"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["outcome"], "settled");
    app.bus.settle().await;

    let (_, view) = app.get(&format!("/adoptions/{intent_id}"), None).await;
    assert_eq!(view["state"], "COMPLETED");
    assert_eq!(view["tree"]["custom_name"], "Bob");
    assert_eq!(app.available(&plot_id).await, 6);
}

#[tokio::test]
async fn test_adoption_requires_caller() {
    let app = TestApp::new().await;
    let (species_id, plot_id) = app.seed_catalog().await;

    let (status, _) = app
        .post(
            "/adoptions",
            None,
            json!({"species_id": species_id, "plot_id": plot_id}),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_adoption_error_statuses() {
    let app = TestApp::new().await;
    let (species_id, plot_id) = app.seed_catalog().await;
    let sponsor = Some(UserId::new());

    let (status, _) = app
        .post(
            "/adoptions",
            sponsor,
            json!({"species_id": "nope", "plot_id": plot_id}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/adoptions",
            sponsor,
            json!({"species_id": common::SpeciesId::new().to_string(), "plot_id": plot_id}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    for _ in 0..2 {
        let (status, _) = app
            .post(
                "/adoptions",
                sponsor,
                json!({"species_id": species_id, "plot_id": plot_id}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (status, body) = app
        .post(
            "/adoptions",
            sponsor,
            json!({"species_id": species_id, "plot_id": plot_id}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("Insufficient space"));
}

#[tokio::test]
async fn test_invoice_outage_is_bad_gateway_and_compensated() {
    let app = TestApp::new().await;
    let (species_id, plot_id) = app.seed_catalog().await;
    app.invoices.set_fail(true);

    let (status, _) = app
        .post(
            "/adoptions",
            Some(UserId::new()),
            json!({"species_id": species_id, "plot_id": plot_id}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(app.available(&plot_id).await, 10);
}

#[tokio::test]
async fn test_wallet_top_up_then_adopt_from_balance() {
    let app = TestApp::new().await;
    let (species_id, plot_id) = app.seed_catalog().await;
    let owner = UserId::new();

    let (status, top_up) = app
        .post("/wallet/top-up", Some(owner), json!({"amount": 100}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(top_up["payment_url"].as_str().is_some());

    app.post(
        "/payments/webhook",
        None,
        json!({"external_id": top_up["transaction_id"], "status": "SETTLED"}),
    )
    .await;

    let (_, balance) = app.get("/wallet/balance", Some(owner)).await;
    assert_eq!(balance["balance"], 100);

    let (status, started) = app
        .post(
            "/adoptions",
            Some(owner),
            json!({"species_id": species_id, "plot_id": plot_id, "custom_name": "Ada"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(started["payment_url"].is_null());
    app.bus.settle().await;

    let (_, balance) = app.get("/wallet/balance", Some(owner)).await;
    assert_eq!(balance["balance"], 50);

    let (_, history) = app.get("/wallet/transactions", Some(owner)).await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["kind"], "ADOPT");
    assert_eq!(history[1]["kind"], "DEPOSIT");

    let intent_id = started["intent_id"].as_str().unwrap();
    let (_, view) = app.get(&format!("/adoptions/{intent_id}"), None).await;
    assert_eq!(view["state"], "COMPLETED");
}

#[tokio::test]
async fn test_top_up_rejects_non_positive_amount() {
    let app = TestApp::new().await;

    let (status, _) = app
        .post("/wallet/top-up", Some(UserId::new()), json!({"amount": 0}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.payments.transaction_count().await, 0);
}

#[tokio::test]
async fn test_top_up_rejects_oversized_duration() {
    let app = TestApp::new().await;

    let (status, _) = app
        .post(
            "/wallet/top-up",
            Some(UserId::new()),
            json!({"amount": 100, "duration_secs": i64::MAX}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.payments.transaction_count().await, 0);
}

#[tokio::test]
async fn test_expiry_check_releases_capacity() {
    let app = TestApp::new().await;
    let (species_id, plot_id) = app.seed_catalog().await;

    let (_, started) = app
        .post(
            "/adoptions",
            Some(UserId::new()),
            json!({"species_id": species_id, "plot_id": plot_id}),
        )
        .await;
    let tx_id = started["invoice_id"].as_str().unwrap().parse().unwrap();
    app.payments
        .set_expires_at(tx_id, chrono::Utc::now() - chrono::Duration::minutes(1))
        .await;

    let (status, report) = app.post("/payments/expiry-check", None, json!({})).await;
    app.bus.settle().await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["expired"], 1);
    assert_eq!(report["published"], 1);
    assert_eq!(app.available(&plot_id).await, 10);
}

#[tokio::test]
async fn test_webhook_callback_token() {
    let config = Config {
        webhook_callback_token: Some("s3cret".to_string()),
        ..Config::default()
    };
    let app = TestApp::with_config(config).await;
    let body = json!({"external_id": common::TransactionId::new(), "status": "PAID"});

    let (status, _) = app.post("/payments/webhook", None, body.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method("POST")
        .uri("/payments/webhook")
        .header("content-type", "application/json")
        .header("x-callback-token", "s3cret")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, _) = app.send(request).await;
    // Token accepted; the transaction itself is unknown.
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_webhook() {
    let app = TestApp::new().await;

    let (status, _) = app
        .post("/payments/webhook", None, json!({"status": "PAID"}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
