//! Shared test fixtures: in-memory store and billing platform fakes.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use secrecy::Secret;

use invoice_sync::clients::{
    BillingPlatform, CounterUpdate, CreatedInvoice, InvoiceRequest, StoreRecord,
    SubscriptionStore,
};
use invoice_sync::config::{BillingConfig, StoreConfig, SyncConfig};
use invoice_sync::models::{DiscountGrid, DiscountTier, SubscriptionFields};
use sync_core::error::AppError;

pub fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

pub fn test_config(dry_run: bool) -> SyncConfig {
    SyncConfig {
        common: sync_core::config::Config {
            log_level: "info".to_string(),
        },
        service_name: "invoice-sync".to_string(),
        dry_run,
        finalize_invoices: true,
        store: StoreConfig {
            api_key: Secret::new("key".to_string()),
            base_id: "appTest01".to_string(),
            api_url: "https://store.local/v0".to_string(),
            subscriptions_table: "subscriptions".to_string(),
            grids_table: "discount_grids".to_string(),
        },
        billing: BillingConfig {
            client_id: "id".to_string(),
            client_secret: Secret::new("secret".to_string()),
            api_url: "https://billing.local/v2".to_string(),
            token_url: "https://billing.local/oauth2/token".to_string(),
            tax_rate: Decimal::from(20),
            currency: "EUR".to_string(),
        },
    }
}

pub fn subscription_record(
    id: &str,
    client_id: &str,
    start: &str,
    months_billed: u32,
    remaining: u32,
    price: u32,
) -> StoreRecord<SubscriptionFields> {
    StoreRecord {
        id: id.to_string(),
        fields: SubscriptionFields {
            service_name: Some(format!("Service {id}")),
            client_id: Some(client_id.to_string()),
            item_id: Some(format!("item-{id}")),
            unit_price: Some(Decimal::from(price)),
            start_date: Some(date(start)),
            months_billed: Some(months_billed),
            remaining_occurrences: Some(remaining),
            discount_grid: None,
            progressive_discount: None,
        },
    }
}

pub fn grid(name: &str, active: bool, default: bool, percent: u32) -> DiscountGrid {
    let tier = DiscountTier {
        percent: Decimal::from(percent),
        label: name.to_string(),
    };
    DiscountGrid {
        name: name.to_string(),
        active,
        default,
        tiers: [tier.clone(), tier.clone(), tier],
    }
}

#[derive(Default)]
pub struct FakeStore {
    pub subscriptions: Vec<StoreRecord<SubscriptionFields>>,
    pub grids: Vec<DiscountGrid>,
    pub grids_by_id: HashMap<String, DiscountGrid>,
    pub updates: Mutex<Vec<(String, CounterUpdate)>>,
    pub grid_list_calls: AtomicUsize,
    pub fail_update_for: Option<String>,
}

#[async_trait]
impl SubscriptionStore for FakeStore {
    async fn list_eligible_subscriptions(
        &self,
    ) -> Result<Vec<StoreRecord<SubscriptionFields>>, AppError> {
        Ok(self.subscriptions.clone())
    }

    async fn get_discount_grid(&self, record_id: &str) -> Result<DiscountGrid, AppError> {
        self.grids_by_id.get(record_id).cloned().ok_or_else(|| {
            AppError::ExternalService {
                service: "store",
                status: 404,
                body: format!("grid {record_id} not found"),
            }
        })
    }

    async fn list_discount_grids(&self) -> Result<Vec<DiscountGrid>, AppError> {
        self.grid_list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.grids.clone())
    }

    async fn update_counters(
        &self,
        record_id: &str,
        update: &CounterUpdate,
    ) -> Result<(), AppError> {
        if self.fail_update_for.as_deref() == Some(record_id) {
            return Err(AppError::ExternalService {
                service: "store",
                status: 503,
                body: "store unavailable".to_string(),
            });
        }
        self.updates
            .lock()
            .unwrap()
            .push((record_id.to_string(), update.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeBilling {
    pub invoices: Mutex<Vec<InvoiceRequest>>,
    pub finalized: Mutex<Vec<(String, Option<NaiveDate>)>>,
    pub fail_create_for_client: Option<String>,
    pub fail_finalize: bool,
}

#[async_trait]
impl BillingPlatform for FakeBilling {
    async fn standard_tax_id(&self) -> Result<u64, AppError> {
        Ok(7)
    }

    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<CreatedInvoice, AppError> {
        if self.fail_create_for_client.as_deref() == Some(request.company_id.as_str()) {
            return Err(AppError::ExternalService {
                service: "billing",
                status: 500,
                body: "invoice rejected".to_string(),
            });
        }
        let mut invoices = self.invoices.lock().unwrap();
        invoices.push(request.clone());
        Ok(CreatedInvoice {
            id: format!("inv-{}", invoices.len()),
        })
    }

    async fn finalize_invoice(
        &self,
        invoice_id: &str,
        date: Option<NaiveDate>,
    ) -> Result<(), AppError> {
        if self.fail_finalize {
            return Err(AppError::ExternalService {
                service: "billing",
                status: 500,
                body: "finalize rejected".to_string(),
            });
        }
        self.finalized
            .lock()
            .unwrap()
            .push((invoice_id.to_string(), date));
        Ok(())
    }
}
