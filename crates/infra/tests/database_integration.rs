//! End-to-end coverage for the SQLite stores and the event guard.
//!
//! Each test operates on an isolated database file with migrations applied.

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use ringrelay_core::{CompareAndSwapOutcome, EventStateGuard, EventStore};
use ringrelay_domain::{
    AlarmMode, ConflictReason, EventRecord, EventStatus, Principal, RelayError, RelayEvent,
};
use ringrelay_infra::database::{DbManager, SqliteEventStore};
use tempfile::TempDir;

struct DbHarness {
    #[allow(dead_code)]
    temp_dir: TempDir,
    manager: Arc<DbManager>,
}

impl DbHarness {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("temporary directory should be created");
        let db_path = temp_dir.path().join("infra-integration.db");

        let manager =
            Arc::new(DbManager::new(&db_path, 8).expect("database manager should initialise"));
        manager.run_migrations().expect("schema migrations should apply");

        Self { temp_dir, manager }
    }

    fn events(&self) -> Arc<SqliteEventStore> {
        Arc::new(SqliteEventStore::new(Arc::clone(&self.manager)))
    }
}

fn record(uuid: &str, status: EventStatus) -> EventRecord {
    EventRecord {
        principal: Principal::new("user-1"),
        uuid: uuid.into(),
        status,
        mode: Some(AlarmMode::Away),
        delay_secs: 30,
        updated_at: Utc::now() - ChronoDuration::minutes(1),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn upsert_and_get_round_trip_all_fields() {
    let harness = DbHarness::new();
    let store = harness.events();
    let seeded = record("A", EventStatus::Scheduled);

    store.upsert(&seeded).await.unwrap();
    let loaded = store.get(&seeded.principal).await.unwrap().unwrap();

    assert_eq!(loaded.uuid, "A");
    assert_eq!(loaded.status, EventStatus::Scheduled);
    assert_eq!(loaded.mode, Some(AlarmMode::Away));
    assert_eq!(loaded.delay_secs, 30);
    assert_eq!(loaded.updated_at.timestamp_millis(), seeded.updated_at.timestamp_millis());
    assert!(store.get(&Principal::new("other")).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn compare_and_swap_applies_only_on_match() {
    let harness = DbHarness::new();
    let store = harness.events();
    let seeded = record("A", EventStatus::Scheduled);
    store.upsert(&seeded).await.unwrap();
    let now = Utc::now();

    let rejected = store
        .compare_and_swap(&seeded.principal, "B", EventStatus::Scheduled, EventStatus::Processing, now)
        .await
        .unwrap();
    match rejected {
        CompareAndSwapOutcome::Rejected { current: Some(current) } => {
            assert_eq!(current.uuid, "A");
            assert_eq!(current.status, EventStatus::Scheduled);
        }
        other => panic!("expected rejection, got {:?}", other),
    }

    let applied = store
        .compare_and_swap(&seeded.principal, "A", EventStatus::Scheduled, EventStatus::Processing, now)
        .await
        .unwrap();
    match applied {
        CompareAndSwapOutcome::Applied(record) => {
            assert_eq!(record.status, EventStatus::Processing);
            assert_eq!(record.updated_at.timestamp_millis(), now.timestamp_millis());
        }
        other => panic!("expected applied, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn complete_with_foreign_uuid_leaves_record_unchanged() {
    let harness = DbHarness::new();
    let store = harness.events();
    store.upsert(&record("A", EventStatus::Processing)).await.unwrap();
    let before = store.get(&Principal::new("user-1")).await.unwrap().unwrap();
    let guard = EventStateGuard::new(store.clone());

    let err = guard.complete(&RelayEvent::new("user-1", "B")).await.unwrap_err();

    assert_eq!(
        err,
        RelayError::Conflict(ConflictReason::Blocked {
            current_uuid: "A".into(),
            status: EventStatus::Processing,
        })
    );
    let after = store.get(&Principal::new("user-1")).await.unwrap().unwrap();
    assert_eq!(after, before);
}

#[tokio::test(flavor = "multi_thread")]
async fn guard_runs_full_lifecycle() {
    let harness = DbHarness::new();
    let store = harness.events();
    store.upsert(&record("A", EventStatus::Scheduled)).await.unwrap();
    let guard = EventStateGuard::new(store.clone());
    let event = RelayEvent::new("user-1", "A");

    let acknowledged = guard.acknowledge(&event).await.unwrap();
    let completed = guard.complete(&event).await.unwrap();

    assert_eq!(acknowledged.status, EventStatus::Processing);
    assert_eq!(completed.status, EventStatus::Processed);
    assert!(guard.acknowledge(&event).await.unwrap_err().is_conflict());
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_record_is_conflict_not_store_failure() {
    let harness = DbHarness::new();
    let guard = EventStateGuard::new(harness.events());

    let err = guard.acknowledge(&RelayEvent::new("user-1", "A")).await.unwrap_err();

    assert_eq!(err, RelayError::Conflict(ConflictReason::Missing));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_acknowledge_has_single_winner() {
    let harness = DbHarness::new();
    let store = harness.events();
    store.upsert(&record("A", EventStatus::Scheduled)).await.unwrap();
    let guard = EventStateGuard::new(store.clone());
    let event = RelayEvent::new("user-1", "A");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let guard = guard.clone();
            let event = event.clone();
            tokio::spawn(async move { guard.acknowledge(&event).await })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(err) => assert!(err.is_conflict(), "unexpected error: {err}"),
        }
    }
    assert_eq!(winners, 1);
}
