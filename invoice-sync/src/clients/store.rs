//! Record store client (Airtable-style REST API).

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sync_core::error::AppError;
use sync_core::http::{DEFAULT_REQUEST_TIMEOUT, RetryConfig, build_client, retry_http_call};

use super::SubscriptionStore;
use crate::config::StoreConfig;
use crate::models::{DiscountGrid, DiscountGridFields, SubscriptionFields};

const SERVICE: &str = "store";

/// Prefilter pushed down to the store: only subscription records with
/// remaining occurrences and a start date are candidates for billing.
const ELIGIBLE_FILTER: &str =
    "AND({Category} = 'Subscription', {Remaining Occurrences} > 0, {Start Date} != '')";

/// One record in the store: server-assigned id plus typed fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreRecord<F> {
    pub id: String,
    pub fields: F,
}

#[derive(Debug, Deserialize)]
struct RecordPage<F> {
    records: Vec<StoreRecord<F>>,
    #[serde(default)]
    offset: Option<String>,
}

/// Counter values written back after a successful invoice submission.
///
/// Absolute values, so the patch is idempotent and safe to retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterUpdate {
    #[serde(rename = "Months Billed")]
    pub months_billed: u32,
    #[serde(rename = "Remaining Occurrences")]
    pub remaining_occurrences: u32,
    #[serde(rename = "Last Invoice ID", skip_serializing_if = "Option::is_none")]
    pub last_invoice_id: Option<String>,
}

pub struct StoreClient {
    http: Client,
    base_url: String,
    api_key: Secret<String>,
    subscriptions_table: String,
    grids_table: String,
    retry: RetryConfig,
}

impl StoreClient {
    pub fn new(config: &StoreConfig) -> Result<Self, AppError> {
        Ok(Self {
            http: build_client(DEFAULT_REQUEST_TIMEOUT)?,
            base_url: format!("{}/{}", config.api_url.trim_end_matches('/'), config.base_id),
            api_key: config.api_key.clone(),
            subscriptions_table: config.subscriptions_table.clone(),
            grids_table: config.grids_table.clone(),
            retry: RetryConfig::default(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    async fn fetch_page<F: DeserializeOwned>(
        &self,
        url: &str,
        formula: Option<&str>,
        offset: Option<&str>,
    ) -> Result<RecordPage<F>, AppError> {
        let mut request = self.http.get(url).bearer_auth(self.api_key.expose_secret());
        if let Some(formula) = formula {
            request = request.query(&[("filterByFormula", formula)]);
        }
        if let Some(offset) = offset {
            request = request.query(&[("offset", offset)]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(AppError::from_response(SERVICE, response).await);
        }
        Ok(response.json().await?)
    }

    /// Fetch every page of a table, following the store's offset cursor.
    async fn fetch_all<F: DeserializeOwned>(
        &self,
        table: &str,
        formula: Option<&str>,
        operation: &str,
    ) -> Result<Vec<StoreRecord<F>>, AppError> {
        let url = self.table_url(table);
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let page = retry_http_call(&self.retry, operation, || {
                let url = url.clone();
                let offset = offset.clone();
                async move { self.fetch_page(&url, formula, offset.as_deref()).await }
            })
            .await?;

            records.extend(page.records);
            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        Ok(records)
    }
}

#[async_trait]
impl SubscriptionStore for StoreClient {
    async fn list_eligible_subscriptions(
        &self,
    ) -> Result<Vec<StoreRecord<SubscriptionFields>>, AppError> {
        self.fetch_all(
            &self.subscriptions_table,
            Some(ELIGIBLE_FILTER),
            "list_subscriptions",
        )
        .await
    }

    async fn get_discount_grid(&self, record_id: &str) -> Result<DiscountGrid, AppError> {
        let url = format!("{}/{}", self.table_url(&self.grids_table), record_id);

        let record = retry_http_call(&self.retry, "get_discount_grid", || async {
            let response = self
                .http
                .get(&url)
                .bearer_auth(self.api_key.expose_secret())
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(AppError::from_response(SERVICE, response).await);
            }
            Ok(response.json::<StoreRecord<DiscountGridFields>>().await?)
        })
        .await?;

        Ok(DiscountGrid::from(record.fields))
    }

    async fn list_discount_grids(&self) -> Result<Vec<DiscountGrid>, AppError> {
        let records = self
            .fetch_all::<DiscountGridFields>(&self.grids_table, None, "list_discount_grids")
            .await?;

        Ok(records
            .into_iter()
            .map(|record| DiscountGrid::from(record.fields))
            .collect())
    }

    async fn update_counters(
        &self,
        record_id: &str,
        update: &CounterUpdate,
    ) -> Result<(), AppError> {
        let url = format!("{}/{}", self.table_url(&self.subscriptions_table), record_id);

        let mut fields = serde_json::to_value(update).map_err(anyhow::Error::new)?;
        fields["Last Synced"] = json!(Utc::now().to_rfc3339());
        let body = json!({ "fields": fields });

        retry_http_call(&self.retry, "update_counters", || async {
            let response = self
                .http
                .patch(&url)
                .bearer_auth(self.api_key.expose_secret())
                .json(&body)
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(AppError::from_response(SERVICE, response).await);
            }
            Ok(())
        })
        .await
    }
}
