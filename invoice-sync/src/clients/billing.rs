//! Billing platform client (OAuth2 client credentials + REST).

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sync_core::error::AppError;
use sync_core::http::{DEFAULT_REQUEST_TIMEOUT, RetryConfig, build_client, retry_http_call};
use tokio::sync::{Mutex, OnceCell};

use super::BillingPlatform;
use crate::config::BillingConfig;

const SERVICE: &str = "billing";

/// Margin before expiry at which a token is refreshed rather than reused.
const TOKEN_REFRESH_MARGIN_MINUTES: i64 = 5;

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Deserialize)]
struct TaxList {
    #[serde(default)]
    data: Vec<TaxEntry>,
}

#[derive(Debug, Deserialize)]
struct TaxEntry {
    id: u64,
    #[serde(default)]
    rate: Decimal,
    #[serde(default)]
    is_active: bool,
}

/// Draft invoice payload.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceRequest {
    pub company_id: String,
    pub currency: String,
    pub subject: String,
    pub notes: String,
    pub lines: Vec<InvoiceLine>,
}

/// One invoice line; discounts are negative-amount lines.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceLine {
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_item_id: Option<String>,
    pub quantity: u32,
    pub unit_amount: Decimal,
    pub tax_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Server-assigned identity of a created invoice.
#[derive(Debug, Clone)]
pub struct CreatedInvoice {
    pub id: String,
}

#[derive(Debug, Deserialize)]
struct InvoiceCreatedResponse {
    data: InvoiceCreatedData,
}

#[derive(Debug, Deserialize)]
struct InvoiceCreatedData {
    id: u64,
}

pub struct BillingClient {
    http: Client,
    api_url: String,
    token_url: String,
    client_id: String,
    client_secret: Secret<String>,
    tax_rate: Decimal,
    token: Mutex<Option<CachedToken>>,
    tax_id: OnceCell<u64>,
    retry: RetryConfig,
}

impl BillingClient {
    pub fn new(config: &BillingConfig) -> Result<Self, AppError> {
        Ok(Self {
            http: build_client(DEFAULT_REQUEST_TIMEOUT)?,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            tax_rate: config.tax_rate,
            token: Mutex::new(None),
            tax_id: OnceCell::new(),
            retry: RetryConfig::default(),
        })
    }

    /// Return a valid access token, refreshing when within the expiry margin.
    async fn access_token(&self) -> Result<String, AppError> {
        let mut guard = self.token.lock().await;

        if let Some(token) = guard.as_ref() {
            if Utc::now() < token.expires_at - Duration::minutes(TOKEN_REFRESH_MARGIN_MINUTES) {
                return Ok(token.value.clone());
            }
        }

        let response = retry_http_call(&self.retry, "access_token", || async {
            let response = self
                .http
                .post(&self.token_url)
                .json(&json!({
                    "grant_type": "client_credentials",
                    "client_id": self.client_id,
                    "client_secret": self.client_secret.expose_secret(),
                }))
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(AppError::from_response(SERVICE, response).await);
            }
            Ok(response.json::<TokenResponse>().await?)
        })
        .await?;

        let token = CachedToken {
            value: response.access_token,
            expires_at: Utc::now() + Duration::seconds(response.expires_in),
        };
        let value = token.value.clone();
        *guard = Some(token);
        Ok(value)
    }
}

#[async_trait]
impl BillingPlatform for BillingClient {
    async fn standard_tax_id(&self) -> Result<u64, AppError> {
        self.tax_id
            .get_or_try_init(|| async {
                let token = self.access_token().await?;
                let url = format!("{}/taxes", self.api_url);

                let taxes = retry_http_call(&self.retry, "list_taxes", || {
                    let url = url.clone();
                    let token = token.clone();
                    async move {
                        let response = self.http.get(&url).bearer_auth(&token).send().await?;
                        if !response.status().is_success() {
                            return Err(AppError::from_response(SERVICE, response).await);
                        }
                        Ok(response.json::<TaxList>().await?)
                    }
                })
                .await?;

                taxes
                    .data
                    .iter()
                    .find(|tax| tax.is_active && tax.rate == self.tax_rate)
                    .map(|tax| tax.id)
                    .ok_or_else(|| {
                        AppError::NotFound(anyhow::anyhow!(
                            "no active tax rate matching {}%",
                            self.tax_rate
                        ))
                    })
            })
            .await
            .copied()
    }

    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<CreatedInvoice, AppError> {
        let token = self.access_token().await?;
        let url = format!("{}/invoices", self.api_url);

        // Submitted exactly once: retrying a non-idempotent create risks
        // duplicate invoices.
        let response = self
            .http
            .post(&url)
            .bearer_auth(&token)
            .json(request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AppError::from_response(SERVICE, response).await);
        }

        let created: InvoiceCreatedResponse = response.json().await?;
        Ok(CreatedInvoice {
            id: created.data.id.to_string(),
        })
    }

    async fn finalize_invoice(
        &self,
        invoice_id: &str,
        date: Option<NaiveDate>,
    ) -> Result<(), AppError> {
        let token = self.access_token().await?;
        let url = format!("{}/invoices/{}/finalize", self.api_url, invoice_id);

        let mut body = json!({});
        if let Some(date) = date {
            body["date"] = json!(date.format("%Y-%m-%d").to_string());
        }

        let response = self
            .http
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AppError::from_response(SERVICE, response).await);
        }

        Ok(())
    }
}
