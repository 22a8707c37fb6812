//! Domain models for invoice-sync.

mod decision;
mod discount_grid;
mod invoice_group;
mod subscription;
mod summary;

pub use decision::{AppliedDiscount, BillingDecision};
pub use discount_grid::{DiscountGrid, DiscountGridFields, DiscountTier};
pub use invoice_group::{GroupKey, GroupStatus, InvoiceGroup};
pub use subscription::{Subscription, SubscriptionFields};
pub use summary::RunSummary;
