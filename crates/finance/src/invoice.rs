//! External invoice provider.
//!
//! The provider is a black box that turns `(external_id, amount, duration)` into
//! a hosted payment page and later reports the outcome through a webhook.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

/// Errors from the invoice provider.
#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("invalid client configuration: {0}")]
    Config(String),

    #[error("invoice request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not parse provider response: {0}")]
    Parse(String),
}

/// What the orchestrator asks the provider for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceRequest {
    /// Our transaction id; echoed back by the webhook.
    pub external_id: String,
    pub amount: i64,
    pub description: String,
    pub duration_secs: i64,
}

/// A created invoice.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Invoice {
    pub invoice_url: String,
    /// Provider expiry, expected as RFC 3339. Not trusted to parse.
    #[serde(default)]
    pub expiry_date: Option<String>,
}

#[async_trait]
pub trait InvoiceProvider: Send + Sync {
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, InvoiceError>;
}

/// Configuration for [`XenditInvoiceClient`].
#[derive(Debug, Clone)]
pub struct InvoiceClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub currency: String,
}

impl InvoiceClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: "https://api.xendit.co".to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(10),
            currency: "IDR".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }
}

#[derive(Serialize)]
struct CreateInvoiceBody<'a> {
    external_id: &'a str,
    amount: i64,
    description: &'a str,
    invoice_duration: i64,
    currency: &'a str,
}

/// HTTP client for the Xendit invoice API.
///
/// Authenticates with the API key as the basic-auth user and an empty password.
pub struct XenditInvoiceClient {
    client: Client,
    config: InvoiceClientConfig,
}

impl XenditInvoiceClient {
    pub fn new(config: InvoiceClientConfig) -> Result<Self, InvoiceError> {
        if config.api_key.is_empty() {
            return Err(InvoiceError::Config("API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| InvoiceError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/v2/invoices", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl InvoiceProvider for XenditInvoiceClient {
    #[tracing::instrument(skip(self, request), fields(external_id = %request.external_id))]
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, InvoiceError> {
        let body = CreateInvoiceBody {
            external_id: &request.external_id,
            amount: request.amount,
            description: &request.description,
            invoice_duration: request.duration_secs,
            currency: &self.config.currency,
        };

        let response = self
            .client
            .post(self.endpoint())
            .basic_auth(&self.config.api_key, Some(""))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InvoiceError::Timeout
                } else {
                    InvoiceError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InvoiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let invoice: Invoice = response.json().await.map_err(|e| {
            if e.is_timeout() {
                InvoiceError::Timeout
            } else {
                InvoiceError::Parse(e.to_string())
            }
        })?;

        debug!(invoice_url = %invoice.invoice_url, "invoice created");
        Ok(invoice)
    }
}

/// In-memory invoice provider for tests and local runs.
///
/// Returns a deterministic checkout URL per external id and an expiry of
/// `now + duration`.
#[derive(Clone, Default)]
pub struct InMemoryInvoiceProvider {
    requests: Arc<RwLock<Vec<InvoiceRequest>>>,
    fail: Arc<AtomicBool>,
    expiry_override: Arc<RwLock<Option<String>>>,
}

impl InMemoryInvoiceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent invoice requests fail as if the provider were unreachable.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Replaces the expiry returned with subsequent invoices.
    pub async fn set_expiry_date(&self, expiry_date: Option<String>) {
        *self.expiry_override.write().await = expiry_date;
    }

    /// Returns every request received so far.
    pub async fn requests(&self) -> Vec<InvoiceRequest> {
        self.requests.read().await.clone()
    }

    pub fn checkout_url(external_id: &str) -> String {
        format!("https://checkout.local/invoices/{}", external_id)
    }
}

#[async_trait]
impl InvoiceProvider for InMemoryInvoiceProvider {
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, InvoiceError> {
        self.requests.write().await.push(request.clone());

        if self.fail.load(Ordering::SeqCst) {
            return Err(InvoiceError::Network(
                "simulated provider outage".to_string(),
            ));
        }

        let expiry_date = match self.expiry_override.read().await.clone() {
            Some(expiry) => expiry,
            None => (Utc::now() + chrono::Duration::seconds(request.duration_secs)).to_rfc3339(),
        };

        Ok(Invoice {
            invoice_url: Self::checkout_url(&request.external_id),
            expiry_date: Some(expiry_date),
        })
    }
}
