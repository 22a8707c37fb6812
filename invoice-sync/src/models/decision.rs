//! Billing decision computed per subscription, per run.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Discount resolved for the month being billed.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedDiscount {
    pub percent: Decimal,
    pub label: String,
}

/// Outcome of evaluating one subscription against the current date.
///
/// Computed fresh each run, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct BillingDecision {
    pub record_id: String,
    pub client_id: String,
    pub item_id: String,
    pub service_name: String,
    pub due: bool,
    /// Whole calendar months since the start date; negative for future starts.
    pub elapsed_months: i32,
    /// The single month billed this run: months billed + 1.
    pub bill_month: u32,
    /// Months in arrears beyond the one being billed.
    pub backlog_months: u32,
    /// First day of the month the invoice targets.
    pub target_period: NaiveDate,
    pub unit_price: Decimal,
    pub discount: Option<AppliedDiscount>,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
    pub months_billed: u32,
    pub remaining_occurrences: u32,
}
