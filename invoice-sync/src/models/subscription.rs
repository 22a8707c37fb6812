//! Subscription model.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sync_core::error::AppError;

use crate::clients::StoreRecord;

/// Raw subscription fields as returned by the store.
///
/// Every field is optional so a row never fails to deserialize; records are
/// validated when converted into [`Subscription`], and malformed rows are
/// rejected at that boundary with the missing fields named.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionFields {
    #[serde(rename = "Service Name", default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(rename = "Client ID", default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(rename = "Item ID", default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(rename = "Unit Price", default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Decimal>,
    #[serde(rename = "Start Date", default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "Months Billed", default, skip_serializing_if = "Option::is_none")]
    pub months_billed: Option<u32>,
    #[serde(
        rename = "Remaining Occurrences",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub remaining_occurrences: Option<u32>,
    #[serde(rename = "Discount Grid", default, skip_serializing_if = "Option::is_none")]
    pub discount_grid: Option<Vec<String>>,
    #[serde(
        rename = "Progressive Discount",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub progressive_discount: Option<bool>,
}

/// Validated subscription record.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub record_id: String,
    pub service_name: String,
    pub client_id: String,
    pub item_id: String,
    pub unit_price: Decimal,
    pub start_date: NaiveDate,
    pub months_billed: u32,
    pub remaining_occurrences: u32,
    /// First linked grid, if the record references one.
    pub discount_grid_id: Option<String>,
    pub apply_progressive_discount: bool,
}

impl Subscription {
    /// Validate a store record into a typed subscription.
    ///
    /// Client id, item id, start date and a positive unit price are
    /// required; absence of any yields `MissingData` naming all of them.
    pub fn from_record(record: &StoreRecord<SubscriptionFields>) -> Result<Self, AppError> {
        let fields = &record.fields;
        let mut missing = Vec::new();

        if fields.client_id.as_deref().is_none_or(str::is_empty) {
            missing.push("Client ID");
        }
        if fields.item_id.as_deref().is_none_or(str::is_empty) {
            missing.push("Item ID");
        }
        if fields.start_date.is_none() {
            missing.push("Start Date");
        }
        match fields.unit_price {
            Some(price) if price > Decimal::ZERO => {}
            _ => missing.push("Unit Price"),
        }

        if !missing.is_empty() {
            return Err(AppError::MissingData {
                record_id: record.id.clone(),
                fields: missing,
            });
        }

        Ok(Self {
            record_id: record.id.clone(),
            service_name: fields
                .service_name
                .clone()
                .unwrap_or_else(|| "Service".to_string()),
            client_id: fields.client_id.clone().unwrap_or_default(),
            item_id: fields.item_id.clone().unwrap_or_default(),
            unit_price: fields.unit_price.unwrap_or_default(),
            start_date: fields.start_date.unwrap_or_default(),
            months_billed: fields.months_billed.unwrap_or(0),
            remaining_occurrences: fields.remaining_occurrences.unwrap_or(0),
            discount_grid_id: fields
                .discount_grid
                .as_ref()
                .and_then(|links| links.first())
                .cloned(),
            apply_progressive_discount: fields.progressive_discount.unwrap_or(true),
        })
    }
}
