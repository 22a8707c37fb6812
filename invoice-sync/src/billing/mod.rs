//! Billing-cycle evaluation: discount resolution, eligibility, grouping.

pub mod discount;
pub mod eligibility;
pub mod grouping;
