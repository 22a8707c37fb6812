//! Grouped invoice model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::BillingDecision;

/// Progress of one invoice group through a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    Pending,
    Submitted,
    Finalized,
    Persisted,
}

impl GroupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupStatus::Pending => "pending",
            GroupStatus::Submitted => "submitted",
            GroupStatus::Finalized => "finalized",
            GroupStatus::Persisted => "persisted",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "submitted" => GroupStatus::Submitted,
            "finalized" => GroupStatus::Finalized,
            "persisted" => GroupStatus::Persisted,
            _ => GroupStatus::Pending,
        }
    }
}

/// Key identifying one grouped invoice: a client and a target billing month.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct GroupKey {
    pub client_id: String,
    /// First day of the target billing month.
    pub period: NaiveDate,
}

impl GroupKey {
    /// Year-month form of the period, e.g. `2025-03`.
    pub fn period_label(&self) -> String {
        self.period.format("%Y-%m").to_string()
    }
}

/// Due decisions sharing a client and a target month, billed as one invoice.
///
/// Exists only for the duration of a run. A failure before `submitted`
/// leaves no external side effects; after it, the created invoice stands.
#[derive(Debug, Clone)]
pub struct InvoiceGroup {
    pub key: GroupKey,
    pub lines: Vec<BillingDecision>,
    pub status: GroupStatus,
    pub invoice_id: Option<String>,
    pub finalized: bool,
}
