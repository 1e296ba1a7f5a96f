//! Snapshot durability: state survives a coordinator restart, and a failed
//! durable write never poisons the in-memory state.

use scout_core::config::ScoutConfig;
use scout_core::dispatch::MemorySink;
use scout_core::orchestration::{Coordinator, EnqueueOutcome, ReportSubmission};
use scout_core::store::{FileSnapshotStore, SnapshotStore};
use scout_core::{Result, ScoutError};
use std::sync::Arc;

async fn coordinator_at(path: &std::path::Path) -> Coordinator {
    Coordinator::new(
        ScoutConfig::default(),
        Arc::new(MemorySink::new()),
        Arc::new(FileSnapshotStore::new(path)),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn state_survives_restart() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("scout.json");

    {
        let coordinator = coordinator_at(&path).await;
        coordinator.enqueue_unit("srv-a").await;
        coordinator.enqueue_unit("srv-b").await;
        coordinator
            .report_result(ReportSubmission::new("srv-a").with_value(75_000_000.0))
            .await?;
        coordinator.claim_next("w1").await.unwrap();
        coordinator.shutdown().await;
    }

    let restarted = coordinator_at(&path).await;
    // srv-a is still leased to w1; only srv-b is claimable.
    assert_eq!(restarted.claim_next("w2").await.unwrap().id, "srv-b");
    assert!(restarted.claim_next("w2").await.is_none());

    assert_eq!(
        restarted.enqueue_unit("srv-a").await,
        EnqueueOutcome::AlreadyExists
    );
    let stats = restarted.stats();
    assert_eq!(stats.total_results, 1);
    assert_eq!(stats.tier_count("50-100M"), Some(1));
    Ok(())
}

#[tokio::test]
async fn missing_snapshot_is_a_clean_start() {
    let dir = tempfile::tempdir().unwrap();
    let coordinator = coordinator_at(&dir.path().join("never-written.json")).await;
    assert!(coordinator.list_units(None).is_empty());
    assert_eq!(coordinator.stats().total_results, 0);
}

#[tokio::test]
async fn reset_persists_the_empty_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scout.json");

    {
        let coordinator = coordinator_at(&path).await;
        coordinator.enqueue_unit("srv-a").await;
        coordinator.reset().await;
        coordinator.shutdown().await;
    }

    let restarted = coordinator_at(&path).await;
    assert!(restarted.list_units(None).is_empty());
}

/// A snapshot store whose writes always fail.
struct BrokenSnapshotStore;

#[async_trait::async_trait]
impl SnapshotStore for BrokenSnapshotStore {
    async fn load(&self) -> Result<Option<scout_core::store::CoordinatorSnapshot>> {
        Ok(None)
    }

    async fn persist(&self, _: &scout_core::store::CoordinatorSnapshot) -> Result<()> {
        Err(ScoutError::PersistenceError("disk on fire".to_string()))
    }
}

#[tokio::test]
async fn persistence_failure_keeps_memory_authoritative() {
    let coordinator = Coordinator::new(
        ScoutConfig::default(),
        Arc::new(MemorySink::new()),
        Arc::new(BrokenSnapshotStore),
    )
    .await
    .unwrap();

    // Every operation still succeeds against the in-memory state.
    coordinator.enqueue_unit("srv-a").await;
    let claimed = coordinator.claim_next("w1").await.unwrap();
    assert_eq!(claimed.id, "srv-a");
    coordinator.mark_scanned("srv-a", "w1").await.unwrap();
    assert_eq!(coordinator.list_units(None).len(), 1);
}
