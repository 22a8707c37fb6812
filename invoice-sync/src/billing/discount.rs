//! Discount grid resolution.

use sync_core::error::AppError;
use tokio::sync::OnceCell;

use crate::clients::SubscriptionStore;
use crate::models::{DiscountGrid, Subscription};

/// Resolves the discount grid applicable to a subscription.
///
/// A subscription referencing a grid uses it when active; otherwise the
/// default active grid applies. Absence of any grid means no discount,
/// not an error. The default grid is looked up at most once per run.
pub struct DiscountResolver<'a, S: SubscriptionStore> {
    store: &'a S,
    cached_default: OnceCell<Option<DiscountGrid>>,
}

impl<'a, S: SubscriptionStore> DiscountResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            cached_default: OnceCell::new(),
        }
    }

    /// Effective grid for one subscription, or `None` for no discount.
    pub async fn resolve(
        &self,
        subscription: &Subscription,
    ) -> Result<Option<DiscountGrid>, AppError> {
        if let Some(grid_id) = &subscription.discount_grid_id {
            match self.store.get_discount_grid(grid_id).await {
                Ok(grid) if grid.active => return Ok(Some(grid)),
                Ok(grid) => {
                    tracing::warn!(
                        record_id = %subscription.record_id,
                        grid = %grid.name,
                        "Referenced discount grid is inactive, using default"
                    );
                }
                Err(e) => {
                    return Err(AppError::DiscountResolution(format!("grid {grid_id}: {e}")));
                }
            }
        }

        self.default_grid().await
    }

    async fn default_grid(&self) -> Result<Option<DiscountGrid>, AppError> {
        let cached = self
            .cached_default
            .get_or_try_init(|| async {
                let grids = self.store.list_discount_grids().await.map_err(|e| {
                    AppError::DiscountResolution(format!("default grid lookup: {e}"))
                })?;
                Ok::<_, AppError>(select_default(&grids).cloned())
            })
            .await?;

        Ok(cached.clone())
    }
}

/// First grid flagged both default and active wins.
///
/// With more than one candidate the result depends on the store's return
/// order; the store schema is expected to keep a single default.
pub fn select_default(grids: &[DiscountGrid]) -> Option<&DiscountGrid> {
    grids.iter().find(|grid| grid.default && grid.active)
}
