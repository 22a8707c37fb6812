//! Billing eligibility evaluation.

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;

use crate::models::{AppliedDiscount, BillingDecision, DiscountGrid, Subscription};

/// Whole calendar months elapsed between the start date and today.
///
/// Day-of-month is intentionally ignored: billing follows calendar months,
/// not anniversary dates.
pub fn elapsed_months(start: NaiveDate, today: NaiveDate) -> i32 {
    (today.year() - start.year()) * 12 + (today.month() as i32 - start.month() as i32)
}

/// Evaluate one subscription against the current date.
///
/// Only the next unbilled month is ever due in a single run; months in
/// arrears beyond it are deferred and surface as `backlog_months`.
pub fn evaluate(
    subscription: &Subscription,
    grid: Option<&DiscountGrid>,
    today: NaiveDate,
) -> BillingDecision {
    let elapsed = elapsed_months(subscription.start_date, today);
    let due = elapsed > subscription.months_billed as i32;
    let bill_month = subscription.months_billed + 1;
    let backlog_months = (elapsed - bill_month as i32).max(0) as u32;

    let discount = grid.and_then(|grid| {
        let tier = grid.tier_for_month(bill_month);
        if tier.percent.is_zero() || tier.label.is_empty() {
            None
        } else {
            Some(AppliedDiscount {
                percent: tier.percent,
                label: tier.label.clone(),
            })
        }
    });

    let discount_amount = match &discount {
        Some(applied) => {
            (subscription.unit_price * applied.percent / Decimal::from(100)).round_dp(2)
        }
        None => Decimal::ZERO,
    };
    let final_amount = (subscription.unit_price - discount_amount).round_dp(2);

    BillingDecision {
        record_id: subscription.record_id.clone(),
        client_id: subscription.client_id.clone(),
        item_id: subscription.item_id.clone(),
        service_name: subscription.service_name.clone(),
        due,
        elapsed_months: elapsed,
        bill_month,
        backlog_months,
        target_period: target_period(subscription.start_date, bill_month),
        unit_price: subscription.unit_price,
        discount,
        discount_amount,
        final_amount,
        months_billed: subscription.months_billed,
        remaining_occurrences: subscription.remaining_occurrences,
    }
}

/// First day of the month the next bill targets.
fn target_period(start: NaiveDate, bill_month: u32) -> NaiveDate {
    let stepped = start + Months::new(bill_month);
    NaiveDate::from_ymd_opt(stepped.year(), stepped.month(), 1).unwrap_or(stepped)
}
