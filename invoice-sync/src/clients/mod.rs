//! Clients for the two external services.

mod billing;
mod store;

pub use billing::{BillingClient, CreatedInvoice, InvoiceLine, InvoiceRequest};
pub use store::{CounterUpdate, StoreClient, StoreRecord};

use async_trait::async_trait;
use chrono::NaiveDate;
use sync_core::error::AppError;

use crate::models::{DiscountGrid, SubscriptionFields};

/// Read/write access to the subscription record store.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Fetch every record matching the billing prefilter.
    async fn list_eligible_subscriptions(
        &self,
    ) -> Result<Vec<StoreRecord<SubscriptionFields>>, AppError>;

    /// Fetch one discount grid by record id.
    async fn get_discount_grid(&self, record_id: &str) -> Result<DiscountGrid, AppError>;

    /// Fetch all discount grids.
    async fn list_discount_grids(&self) -> Result<Vec<DiscountGrid>, AppError>;

    /// Persist advanced counters after an invoice has been created.
    async fn update_counters(
        &self,
        record_id: &str,
        update: &CounterUpdate,
    ) -> Result<(), AppError>;
}

/// Invoice operations on the billing platform.
#[async_trait]
pub trait BillingPlatform: Send + Sync {
    /// Identifier of the active tax rate invoice lines should reference.
    async fn standard_tax_id(&self) -> Result<u64, AppError>;

    /// Submit a draft invoice; returns the server-assigned id.
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<CreatedInvoice, AppError>;

    /// Transition a draft invoice to its billable state.
    async fn finalize_invoice(
        &self,
        invoice_id: &str,
        date: Option<NaiveDate>,
    ) -> Result<(), AppError>;
}
