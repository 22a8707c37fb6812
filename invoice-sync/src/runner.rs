//! Synchronization driver: one end-to-end billing run.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sync_core::error::AppError;

use crate::billing::discount::DiscountResolver;
use crate::billing::{eligibility, grouping};
use crate::clients::{
    BillingPlatform, CounterUpdate, InvoiceLine, InvoiceRequest, SubscriptionStore,
};
use crate::config::SyncConfig;
use crate::models::{GroupStatus, InvoiceGroup, RunSummary, Subscription};

pub struct SyncRunner<S, B> {
    config: SyncConfig,
    store: S,
    billing: B,
}

impl<S: SubscriptionStore, B: BillingPlatform> SyncRunner<S, B> {
    pub fn new(config: SyncConfig, store: S, billing: B) -> Self {
        Self {
            config,
            store,
            billing,
        }
    }

    /// Get a reference to the store client.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get a reference to the billing client.
    pub fn billing(&self) -> &B {
        &self.billing
    }

    /// Execute one synchronization run against the current date.
    pub async fn run(&self) -> Result<RunSummary, AppError> {
        self.run_for_date(Utc::now().date_naive()).await
    }

    /// Execute one synchronization run against an explicit evaluation date.
    pub async fn run_for_date(&self, today: NaiveDate) -> Result<RunSummary, AppError> {
        let mut summary = RunSummary {
            dry_run: self.config.dry_run,
            ..Default::default()
        };

        let records = self.store.list_eligible_subscriptions().await?;
        summary.fetched = records.len();

        if records.is_empty() {
            tracing::info!("No eligible subscriptions to bill today");
            return Ok(summary);
        }
        tracing::info!(count = records.len(), "Eligible subscriptions fetched");

        let resolver = DiscountResolver::new(&self.store);
        let mut due = Vec::new();

        for record in &records {
            let subscription = match Subscription::from_record(record) {
                Ok(subscription) => subscription,
                Err(e) => {
                    summary.invalid += 1;
                    tracing::warn!(record_id = %record.id, error = %e, "Skipping invalid record");
                    continue;
                }
            };

            let grid = if subscription.apply_progressive_discount {
                match resolver.resolve(&subscription).await {
                    Ok(grid) => grid,
                    Err(e) => {
                        tracing::warn!(
                            record_id = %subscription.record_id,
                            error = %e,
                            "Discount unresolved, billing without discount"
                        );
                        None
                    }
                }
            } else {
                None
            };

            let decision = eligibility::evaluate(&subscription, grid.as_ref(), today);
            if !decision.due {
                summary.not_due += 1;
                tracing::debug!(
                    record_id = %decision.record_id,
                    elapsed_months = decision.elapsed_months,
                    months_billed = decision.months_billed,
                    "No billing due"
                );
                continue;
            }

            if decision.backlog_months > 0 {
                tracing::warn!(
                    record_id = %decision.record_id,
                    backlog_months = decision.backlog_months,
                    "Subscription in arrears, only the next month is billed this run"
                );
            }

            summary.due += 1;
            due.push(decision);
        }

        let groups = grouping::group_decisions(due);
        summary.groups = groups.len();

        for mut group in groups {
            let result = self.process_group(&mut group).await;

            if group.invoice_id.is_some() {
                summary.created += 1;
            }
            if group.finalized {
                summary.validated += 1;
            }
            if group.status == GroupStatus::Persisted {
                summary.persisted += 1;
            }

            match result {
                Ok(()) => {
                    if self.config.dry_run {
                        summary.created += 1;
                    }
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(
                        client_id = %group.key.client_id,
                        period = %group.key.period_label(),
                        status = group.status.as_str(),
                        error = %e,
                        "Invoice group failed"
                    );
                }
            }
        }

        Ok(summary)
    }

    /// Bill one group: submit the invoice, optionally finalize it, then
    /// persist the advanced counters for every line.
    async fn process_group(&self, group: &mut InvoiceGroup) -> Result<(), AppError> {
        let period = group.key.period_label();
        let total: Decimal = group.lines.iter().map(|line| line.final_amount).sum();

        if self.config.dry_run {
            tracing::info!(
                client_id = %group.key.client_id,
                period = %period,
                lines = group.lines.len(),
                total = %total,
                "Dry-run: would create invoice"
            );
            for line in &group.lines {
                tracing::info!(
                    record_id = %line.record_id,
                    service = %line.service_name,
                    amount = %line.final_amount,
                    discount = %line.discount_amount,
                    "Dry-run: would bill"
                );
            }
            return Ok(());
        }

        let request = self.build_invoice_request(group).await?;
        let created = self.billing.create_invoice(&request).await?;
        group.status = GroupStatus::Submitted;
        group.invoice_id = Some(created.id.clone());
        tracing::info!(
            invoice_id = %created.id,
            client_id = %group.key.client_id,
            period = %period,
            lines = group.lines.len(),
            total = %total,
            "Invoice created"
        );

        if self.config.finalize_invoices {
            self.billing
                .finalize_invoice(&created.id, Some(group.key.period))
                .await?;
            group.status = GroupStatus::Finalized;
            group.finalized = true;
            tracing::info!(invoice_id = %created.id, "Invoice finalized");
        }

        // The invoice exists externally from here on; counter persistence
        // failures are reported without rolling it back.
        for line in &group.lines {
            let update = CounterUpdate {
                months_billed: line.bill_month,
                remaining_occurrences: line.remaining_occurrences.saturating_sub(1),
                last_invoice_id: Some(created.id.clone()),
            };
            self.store.update_counters(&line.record_id, &update).await?;
            tracing::info!(
                record_id = %line.record_id,
                months_billed = update.months_billed,
                remaining_occurrences = update.remaining_occurrences,
                "Counters updated"
            );
        }
        group.status = GroupStatus::Persisted;

        Ok(())
    }

    async fn build_invoice_request(&self, group: &InvoiceGroup) -> Result<InvoiceRequest, AppError> {
        let tax_id = self.billing.standard_tax_id().await?;

        let mut lines = Vec::with_capacity(group.lines.len() * 2);
        for decision in &group.lines {
            lines.push(InvoiceLine {
                kind: "standard".to_string(),
                label: decision.service_name.clone(),
                related_item_id: Some(decision.item_id.clone()),
                quantity: 1,
                unit_amount: decision.unit_price,
                tax_id,
                unit: Some("month".to_string()),
            });

            if let Some(discount) = &decision.discount {
                lines.push(InvoiceLine {
                    kind: "standard".to_string(),
                    label: format!("{} (-{}%)", discount.label, discount.percent.trunc()),
                    related_item_id: None,
                    quantity: 1,
                    unit_amount: -decision.discount_amount,
                    tax_id,
                    unit: None,
                });
            }
        }

        Ok(InvoiceRequest {
            company_id: group.key.client_id.clone(),
            currency: self.config.billing.currency.clone(),
            subject: format!("Monthly subscriptions - {}", group.key.period_label()),
            notes: "Invoice generated automatically".to_string(),
            lines,
        })
    }
}
