//! Run summary counters.

/// Counters accumulated over one synchronization run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched: usize,
    pub invalid: usize,
    pub not_due: usize,
    pub due: usize,
    pub groups: usize,
    pub created: usize,
    pub validated: usize,
    pub persisted: usize,
    pub failed: usize,
    pub dry_run: bool,
}

impl RunSummary {
    /// Log the tabulated end-of-run counts.
    pub fn emit(&self) {
        tracing::info!(
            fetched = self.fetched,
            invalid = self.invalid,
            not_due = self.not_due,
            due = self.due,
            groups = self.groups,
            created = self.created,
            validated = self.validated,
            persisted = self.persisted,
            failed = self.failed,
            dry_run = self.dry_run,
            "Synchronization summary"
        );

        if self.dry_run {
            tracing::info!("Dry-run mode: no external writes were performed");
        }
    }
}
