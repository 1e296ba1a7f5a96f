//! End-to-end coverage of the coordinator surface: queue ordering, upsert
//! monotonicity, cooldown windows, classification, and stats.

use scout_core::config::ScoutConfig;
use scout_core::dispatch::MemorySink;
use scout_core::orchestration::{Coordinator, EnqueueOutcome, ReportSubmission};
use scout_core::store::MemorySnapshotStore;
use scout_core::{ScoutError, UnitState};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

async fn coordinator_with(config: ScoutConfig) -> (Arc<MemorySink>, Coordinator) {
    let sink = Arc::new(MemorySink::new());
    let coordinator = Coordinator::new(config, sink.clone(), Arc::new(MemorySnapshotStore::new()))
        .await
        .unwrap();
    (sink, coordinator)
}

async fn coordinator() -> (Arc<MemorySink>, Coordinator) {
    coordinator_with(ScoutConfig::default()).await
}

#[tokio::test]
async fn claim_order_is_fifo() {
    let (_, coordinator) = coordinator().await;
    coordinator.enqueue_unit("srv-a").await;
    coordinator.enqueue_unit("srv-b").await;

    assert_eq!(coordinator.claim_next("w1").await.unwrap().id, "srv-a");
    assert_eq!(coordinator.claim_next("w1").await.unwrap().id, "srv-b");
    assert!(coordinator.claim_next("w1").await.is_none());
}

#[tokio::test]
async fn enqueue_is_idempotent() {
    let (_, coordinator) = coordinator().await;
    assert_eq!(coordinator.enqueue_unit("srv-a").await, EnqueueOutcome::Created);
    assert_eq!(
        coordinator.enqueue_unit("srv-a").await,
        EnqueueOutcome::AlreadyExists
    );
    assert_eq!(coordinator.list_units(None).len(), 1);
}

#[tokio::test]
async fn report_upsert_is_monotonic() {
    let (_, coordinator) = coordinator().await;
    coordinator
        .report_result(
            ReportSubmission::new("srv-a")
                .with_tier_flag(true)
                .with_payload(json!({"finds": [{"name": "Alpha", "value_numeric": 2e6}]})),
        )
        .await
        .unwrap();

    // Empty payload and a false flag must not regress the record.
    coordinator
        .report_result(ReportSubmission::new("srv-a").with_payload(json!({})))
        .await
        .unwrap();

    let unit = coordinator.get_unit("srv-a").unwrap();
    assert!(unit.tier_flag);
    assert_eq!(unit.payload["finds"][0]["name"], json!("Alpha"));
    assert_eq!(coordinator.list_units(None).len(), 1);
}

#[tokio::test]
async fn invalid_unit_waits_out_cooldown() {
    let config = ScoutConfig {
        invalid_cooldown: Duration::from_millis(80),
        ..ScoutConfig::default()
    };
    let (_, coordinator) = coordinator_with(config).await;
    coordinator.enqueue_unit("srv-a").await;
    coordinator.mark_invalid("srv-a").await.unwrap();

    assert!(coordinator.claim_next("w1").await.is_none());
    assert_eq!(coordinator.stats().invalid_count, 1);

    tokio::time::sleep(Duration::from_millis(120)).await;
    let reclaimed = coordinator.claim_next("w1").await.unwrap();
    assert_eq!(reclaimed.id, "srv-a");
    assert_eq!(reclaimed.state, UnitState::Assigned);
}

#[tokio::test]
async fn mark_scanned_is_terminal() {
    let (_, coordinator) = coordinator().await;
    coordinator.enqueue_unit("srv-a").await;
    coordinator.claim_next("w1").await.unwrap();

    let scanned = coordinator.mark_scanned("srv-a", "w1").await.unwrap();
    assert_eq!(scanned.state, UnitState::Scanned);
    assert!(scanned.assigned_to.is_none());

    // Never claimable again, and idempotent to re-complete.
    assert!(coordinator.claim_next("w2").await.is_none());
    assert!(coordinator.mark_scanned("srv-a", "w1").await.is_ok());
}

#[tokio::test]
async fn mark_scanned_unknown_id_is_not_found() {
    let (_, coordinator) = coordinator().await;
    coordinator.enqueue_unit("srv-a").await;

    let result = coordinator.mark_scanned("ghost", "w1").await;
    assert!(matches!(result, Err(ScoutError::NotFound(_))));
    assert_eq!(coordinator.list_units(None).len(), 1);
}

#[tokio::test]
async fn report_value_feeds_per_tier_counts() {
    let (_, coordinator) = coordinator().await;
    coordinator
        .report_result(ReportSubmission::new("srv-a").with_value(75_000_000.0))
        .await
        .unwrap();

    let stats = coordinator.stats();
    assert_eq!(stats.tier_count("50-100M"), Some(1));
    assert_eq!(stats.total_results, 1);
}

#[tokio::test]
async fn release_returns_unit_to_queue_head() {
    let (_, coordinator) = coordinator().await;
    coordinator.enqueue_unit("srv-a").await;
    coordinator.enqueue_unit("srv-b").await;

    coordinator.claim_next("w1").await.unwrap();
    assert!(coordinator.release("srv-a", "w1").await.unwrap());
    assert_eq!(coordinator.claim_next("w2").await.unwrap().id, "srv-a");
}

#[tokio::test]
async fn sink_failure_never_fails_the_reporting_caller() {
    let (sink, coordinator) = coordinator().await;
    sink.set_failing(true);

    let ack = coordinator
        .report_result(ReportSubmission::new("srv-a").with_payload(json!({
            "finds": [{"name": "Alpha", "value_numeric": 2e9}]
        })))
        .await
        .unwrap();
    assert!(ack.dispatched);

    coordinator.shutdown().await;
    assert!(sink.sent_tiers().is_empty());
}

#[tokio::test]
async fn stats_track_queue_and_activity() {
    let (_, coordinator) = coordinator().await;
    coordinator.enqueue_unit("srv-a").await;
    coordinator.enqueue_unit("srv-b").await;
    coordinator
        .report_result(ReportSubmission::new("srv-c").with_client("scanner-1"))
        .await
        .unwrap();

    let stats = coordinator.stats();
    // srv-c was reported without a tier flag, so only the enqueued pair is
    // claim-eligible.
    assert_eq!(stats.queue_size, 2);
    assert_eq!(stats.invalid_count, 0);
    assert_eq!(stats.active_clients, 1);
}
