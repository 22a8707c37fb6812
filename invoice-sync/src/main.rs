//! Invoice synchronization entry point.

use invoice_sync::clients::{BillingClient, StoreClient};
use invoice_sync::config::{SyncConfig, mask};
use invoice_sync::runner::SyncRunner;

use sync_core::observability::init_tracing;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load configuration
    let config = SyncConfig::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    // Initialize tracing
    init_tracing(&config.common.log_level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        mode = if config.dry_run { "dry-run" } else { "production" },
        "Starting invoice-sync"
    );

    // Log configuration (mask sensitive values)
    tracing::info!(
        service_name = %config.service_name,
        store_base = %mask(&config.store.base_id),
        subscriptions_table = %config.store.subscriptions_table,
        grids_table = %config.store.grids_table,
        billing_api = %config.billing.api_url,
        tax_rate = %config.billing.tax_rate,
        currency = %config.billing.currency,
        finalize_invoices = config.finalize_invoices,
        "Configuration loaded"
    );

    let store = StoreClient::new(&config.store).map_err(|e| {
        tracing::error!(error = %e, "Failed to build store client");
        std::io::Error::other(e.to_string())
    })?;
    let billing = BillingClient::new(&config.billing).map_err(|e| {
        tracing::error!(error = %e, "Failed to build billing client");
        std::io::Error::other(e.to_string())
    })?;

    let runner = SyncRunner::new(config, store, billing);

    // Per-group failures are reported in the summary, not via the exit
    // status; only top-level errors terminate non-zero.
    match runner.run().await {
        Ok(summary) => {
            summary.emit();
            tracing::info!("Synchronization complete");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Synchronization aborted");
            Err(std::io::Error::other(e.to_string()))
        }
    }
}
