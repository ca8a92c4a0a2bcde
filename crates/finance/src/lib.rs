//! Payment side of the adoption flow.
//!
//! - [`PaymentOrchestrator`] answers payment requests from the wallet or with an
//!   external invoice, and applies provider webhooks
//! - [`InvoiceProvider`] abstracts the external invoice API, with the
//!   [`XenditInvoiceClient`] HTTP implementation
//! - [`ExpirySweeper`] expires invoices whose webhook never arrived

pub mod error;
pub mod invoice;
pub mod orchestrator;
pub mod sweeper;

pub use error::{FinanceError, Result};
pub use invoice::{
    InMemoryInvoiceProvider, Invoice, InvoiceClientConfig, InvoiceError, InvoiceProvider,
    InvoiceRequest, XenditInvoiceClient,
};
pub use orchestrator::{
    DEFAULT_INVOICE_DURATION_SECS, MAX_INVOICE_DURATION_SECS, PaymentOrchestrator,
    PaymentOutcome, PaymentRequest, WebhookOutcome,
};
pub use sweeper::{ExpirySweeper, SweepReport};
