//! Xendit client tests against a local stub of the invoice API.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use finance::{InvoiceClientConfig, InvoiceError, InvoiceProvider, InvoiceRequest, XenditInvoiceClient};
use serde_json::{Value, json};
use tokio::sync::Mutex;

#[derive(Clone, Default)]
struct Captured {
    calls: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn create_invoice(
    State(captured): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let external_id = body["external_id"].as_str().unwrap_or_default().to_string();
    captured.calls.lock().await.push((auth, body));

    Json(json!({
        "id": "inv-123",
        "external_id": external_id,
        "status": "PENDING",
        "invoice_url": format!("https://checkout.stub/{}", external_id),
        "expiry_date": "2030-01-02T03:04:05.000Z",
    }))
}

async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn request() -> InvoiceRequest {
    InvoiceRequest {
        external_id: "6f1c1f0e-3c55-4a61-9a59-4a1d0b8e2f11".to_string(),
        amount: 150_000,
        description: "ADOPT - User 42".to_string(),
        duration_secs: 86_400,
    }
}

#[tokio::test]
async fn creates_invoice_with_basic_auth_and_currency() {
    let captured = Captured::default();
    let router = Router::new()
        .route("/v2/invoices", post(create_invoice))
        .with_state(captured.clone());
    let base_url = spawn_stub(router).await;

    let client = XenditInvoiceClient::new(
        InvoiceClientConfig::new("secret-key").with_base_url(base_url),
    )
    .unwrap();

    let invoice = client.create_invoice(&request()).await.unwrap();

    assert_eq!(
        invoice.invoice_url,
        "https://checkout.stub/6f1c1f0e-3c55-4a61-9a59-4a1d0b8e2f11"
    );
    assert_eq!(
        invoice.expiry_date.as_deref(),
        Some("2030-01-02T03:04:05.000Z")
    );

    let calls = captured.calls.lock().await;
    assert_eq!(calls.len(), 1);
    let (auth, body) = &calls[0];
    // base64("secret-key:")
    assert_eq!(auth.as_deref(), Some("Basic c2VjcmV0LWtleTo="));
    assert_eq!(body["amount"], 150_000);
    assert_eq!(body["currency"], "IDR");
    assert_eq!(body["invoice_duration"], 86_400);
    assert_eq!(body["description"], "ADOPT - User 42");
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let router = Router::new().route(
        "/v2/invoices",
        post(|| async { (StatusCode::UNAUTHORIZED, "invalid api key") }),
    );
    let base_url = spawn_stub(router).await;

    let client =
        XenditInvoiceClient::new(InvoiceClientConfig::new("bad").with_base_url(base_url)).unwrap();

    let err = client.create_invoice(&request()).await.unwrap_err();
    match err {
        InvoiceError::Status { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid api key");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn slow_provider_times_out() {
    let router = Router::new().route(
        "/v2/invoices",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({"invoice_url": "https://late"}))
        }),
    );
    let base_url = spawn_stub(router).await;

    let client = XenditInvoiceClient::new(
        InvoiceClientConfig::new("key")
            .with_base_url(base_url)
            .with_timeout(Duration::from_millis(200)),
    )
    .unwrap();

    let err = client.create_invoice(&request()).await.unwrap_err();
    assert!(matches!(err, InvoiceError::Timeout), "got {err:?}");
}

#[tokio::test]
async fn unreachable_provider_is_a_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = XenditInvoiceClient::new(
        InvoiceClientConfig::new("key").with_base_url(format!("http://{}", addr)),
    )
    .unwrap();

    let err = client.create_invoice(&request()).await.unwrap_err();
    assert!(matches!(err, InvoiceError::Network(_)), "got {err:?}");
}
