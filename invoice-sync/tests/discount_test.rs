//! Discount grid resolution tests.

mod common;

use std::sync::atomic::Ordering;

use common::{FakeStore, date, grid};
use rust_decimal::Decimal;

use invoice_sync::billing::discount::DiscountResolver;
use invoice_sync::models::Subscription;
use sync_core::error::AppError;

fn subscription(grid_id: Option<&str>) -> Subscription {
    Subscription {
        record_id: "rec001".to_string(),
        service_name: "Standard Hosting".to_string(),
        client_id: "12345".to_string(),
        item_id: "100".to_string(),
        unit_price: Decimal::from(100),
        start_date: date("2025-01-01"),
        months_billed: 0,
        remaining_occurrences: 12,
        discount_grid_id: grid_id.map(str::to_string),
        apply_progressive_discount: true,
    }
}

#[tokio::test]
async fn specific_active_grid_wins_over_default() {
    let mut store = FakeStore::default();
    store.grids = vec![grid("Default", true, true, 10)];
    store
        .grids_by_id
        .insert("recGrid1".to_string(), grid("Special", true, false, 30));

    let resolver = DiscountResolver::new(&store);
    let resolved = resolver.resolve(&subscription(Some("recGrid1"))).await.unwrap();
    assert_eq!(resolved.unwrap().name, "Special");
}

#[tokio::test]
async fn inactive_specific_grid_falls_back_to_default() {
    let mut store = FakeStore::default();
    store.grids = vec![grid("Default", true, true, 10)];
    store
        .grids_by_id
        .insert("recGrid1".to_string(), grid("Retired", false, false, 30));

    let resolver = DiscountResolver::new(&store);
    let resolved = resolver.resolve(&subscription(Some("recGrid1"))).await.unwrap();
    assert_eq!(resolved.unwrap().name, "Default");
}

#[tokio::test]
async fn missing_specific_grid_is_a_resolution_error() {
    let store = FakeStore::default();

    let resolver = DiscountResolver::new(&store);
    let err = resolver
        .resolve(&subscription(Some("recMissing")))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DiscountResolution(_)));
}

#[tokio::test]
async fn no_default_grid_means_no_discount() {
    let mut store = FakeStore::default();
    store.grids = vec![grid("Inactive default", false, true, 10)];

    let resolver = DiscountResolver::new(&store);
    let resolved = resolver.resolve(&subscription(None)).await.unwrap();
    assert!(resolved.is_none());
}

#[tokio::test]
async fn default_grid_is_cached_for_the_run() {
    let mut store = FakeStore::default();
    store.grids = vec![grid("Default", true, true, 10)];

    let resolver = DiscountResolver::new(&store);
    for _ in 0..3 {
        let resolved = resolver.resolve(&subscription(None)).await.unwrap();
        assert_eq!(resolved.unwrap().name, "Default");
    }
    assert_eq!(store.grid_list_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn first_of_multiple_defaults_wins() {
    let mut store = FakeStore::default();
    store.grids = vec![
        grid("First", true, true, 10),
        grid("Second", true, true, 20),
    ];

    let resolver = DiscountResolver::new(&store);
    let resolved = resolver.resolve(&subscription(None)).await.unwrap();
    assert_eq!(resolved.unwrap().name, "First");
}
