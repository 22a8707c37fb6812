use rust_decimal::Decimal;
use secrecy::Secret;
use serde::Deserialize;
use std::env;
use sync_core::config as core_config;
use sync_core::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub service_name: String,
    pub dry_run: bool,
    pub finalize_invoices: bool,
    pub store: StoreConfig,
    pub billing: BillingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub api_key: Secret<String>,
    pub base_id: String,
    pub api_url: String,
    pub subscriptions_table: String,
    pub grids_table: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub api_url: String,
    pub token_url: String,
    pub tax_rate: Decimal,
    pub currency: String,
}

impl SyncConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let config = SyncConfig {
            common: common_config,
            service_name: get_env("SERVICE_NAME", Some("invoice-sync"))?,
            dry_run: parse_bool(&get_env("DRY_RUN", Some("false"))?),
            finalize_invoices: parse_bool(&get_env("FINALIZE_INVOICES", Some("true"))?),
            store: StoreConfig {
                api_key: Secret::new(get_env("STORE_API_KEY", None)?),
                base_id: get_env("STORE_BASE_ID", None)?,
                api_url: get_env("STORE_API_URL", Some("https://api.airtable.com/v0"))?,
                subscriptions_table: get_env("STORE_SUBSCRIPTIONS_TABLE", Some("subscriptions"))?,
                grids_table: get_env("STORE_GRIDS_TABLE", Some("discount_grids"))?,
            },
            billing: BillingConfig {
                client_id: get_env("BILLING_CLIENT_ID", None)?,
                client_secret: Secret::new(get_env("BILLING_CLIENT_SECRET", None)?),
                api_url: get_env("BILLING_API_URL", None)?,
                token_url: get_env("BILLING_TOKEN_URL", None)?,
                tax_rate: get_env("BILLING_TAX_RATE", Some("20"))?
                    .parse()
                    .map_err(|e: rust_decimal::Error| {
                        AppError::ConfigError(anyhow::anyhow!("BILLING_TAX_RATE: {}", e))
                    })?,
                currency: get_env("BILLING_CURRENCY", Some("EUR"))?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.billing.tax_rate < Decimal::ZERO || self.billing.tax_rate > Decimal::from(100) {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "BILLING_TAX_RATE must be between 0 and 100"
            )));
        }

        if self.billing.currency.len() != 3 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "BILLING_CURRENCY must be a 3-letter code"
            )));
        }

        for (name, value) in [
            ("STORE_API_URL", &self.store.api_url),
            ("BILLING_API_URL", &self.billing.api_url),
            ("BILLING_TOKEN_URL", &self.billing.token_url),
        ] {
            if !value.starts_with("http") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} must be an http(s) URL",
                    name
                )));
            }
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

/// Shorten an identifier for logging so the full value never hits the logs.
pub fn mask(value: &str) -> String {
    format!("{}***", value.chars().take(6).collect::<String>())
}
