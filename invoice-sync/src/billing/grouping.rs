//! Invoice grouping.

use std::collections::BTreeMap;

use crate::models::{BillingDecision, GroupKey, GroupStatus, InvoiceGroup};

/// Partition due decisions into invoice groups keyed by client and target
/// billing month.
///
/// Every due decision lands in exactly one group. Iteration order is
/// deterministic: client id, then period.
pub fn group_decisions(decisions: Vec<BillingDecision>) -> Vec<InvoiceGroup> {
    let mut grouped: BTreeMap<GroupKey, Vec<BillingDecision>> = BTreeMap::new();

    for decision in decisions.into_iter().filter(|decision| decision.due) {
        let key = GroupKey {
            client_id: decision.client_id.clone(),
            period: decision.target_period,
        };
        grouped.entry(key).or_default().push(decision);
    }

    grouped
        .into_iter()
        .map(|(key, lines)| InvoiceGroup {
            key,
            lines,
            status: GroupStatus::Pending,
            invoice_id: None,
            finalized: false,
        })
        .collect()
}
