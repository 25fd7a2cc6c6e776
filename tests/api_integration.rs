//! Live API tests against the discount backend.
//!
//! Requires network access. Set DISCOUNT_API_URL in a .env file to point at
//! a local backend.
//!
//! Run: cargo test --test api_integration -- --nocapture --ignored

use sentiment_discount_sdk::prelude::*;
use std::env;
use std::time::Duration;

fn client() -> DiscountClient {
    dotenvy::dotenv().ok();
    let base_url = env::var("DISCOUNT_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
    DiscountClient::builder()
        .base_url(&base_url)
        .timeout(Duration::from_secs(15))
        .stream(false)
        .build()
        .expect("client should build")
}

#[tokio::test]
#[ignore]
async fn current_discount_matches_formula() {
    let snapshot = client()
        .discounts()
        .current()
        .await
        .expect("snapshot fetch should succeed");

    println!(
        "index {} -> {} ({})",
        snapshot.index_label(),
        snapshot.discount_label(),
        snapshot.formula_label()
    );
    assert!(snapshot.final_discount_percent <= snapshot.settings.discount_cap);
    assert!((snapshot.recomputed_discount() - snapshot.final_discount_percent).abs() < 0.01);
}

#[tokio::test]
#[ignore]
async fn history_loads_in_order_for_every_scale() {
    let client = client();
    for scale in Timescale::ALL {
        let points = client
            .history()
            .load(scale)
            .await
            .unwrap_or_else(|e| panic!("{scale} history failed: {e}"));
        println!("{scale}: {} points", points.len());
        assert!(points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }
}

#[tokio::test]
#[ignore]
async fn sync_reaches_live() {
    let handle = client().sync(SyncConfig::default()).expect("sync should spawn");
    let mut views = handle.subscribe();

    let view = tokio::time::timeout(
        Duration::from_secs(30),
        views.wait_for(|v| matches!(v.status(), SyncStatus::Live { .. })),
    )
    .await
    .expect("timed out waiting for a live snapshot")
    .expect("sync task stopped")
    .clone();

    println!("{} | {} | {}", view.discount_label(), view.status(), view.history_status());
    assert!(view.snapshot().is_some());

    handle.dispose().await.unwrap();
}
