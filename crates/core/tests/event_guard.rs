//! Event guard transitions against the in-memory store

mod support;

use std::sync::Arc;

use ringrelay_core::EventStateGuard;
use ringrelay_domain::{AlarmMode, ConflictReason, EventStatus, RelayError, RelayEvent};
use support::mocks::InMemoryEventStore;
use support::{event_record, principal, PRINCIPAL};

fn guard_with(status: EventStatus, uuid: &str) -> (EventStateGuard, InMemoryEventStore) {
    let store = InMemoryEventStore::with_record(event_record(uuid, status, Some(AlarmMode::Home)));
    (EventStateGuard::new(Arc::new(store.clone())), store)
}

#[tokio::test]
async fn acknowledge_claims_scheduled_event() {
    let (guard, store) = guard_with(EventStatus::Scheduled, "A");
    let before = store.record(&principal()).unwrap();

    let record = guard.acknowledge(&RelayEvent::new(PRINCIPAL, "A")).await.unwrap();

    assert_eq!(record.status, EventStatus::Processing);
    assert_eq!(record.mode, Some(AlarmMode::Home));
    let stored = store.record(&principal()).unwrap();
    assert_eq!(stored.status, EventStatus::Processing);
    assert!(stored.updated_at > before.updated_at);
}

#[tokio::test]
async fn second_acknowledge_is_already_owned() {
    let (guard, store) = guard_with(EventStatus::Scheduled, "A");
    let event = RelayEvent::new(PRINCIPAL, "A");

    guard.acknowledge(&event).await.unwrap();
    let err = guard.acknowledge(&event).await.unwrap_err();

    assert_eq!(
        err,
        RelayError::Conflict(ConflictReason::AlreadyOwned { status: EventStatus::Processing })
    );
    assert_eq!(store.record(&principal()).unwrap().status, EventStatus::Processing);
}

#[tokio::test]
async fn acknowledge_with_other_uuid_is_blocked() {
    let (guard, store) = guard_with(EventStatus::Scheduled, "A");
    let before = store.record(&principal()).unwrap();

    let err = guard.acknowledge(&RelayEvent::new(PRINCIPAL, "B")).await.unwrap_err();

    assert_eq!(
        err,
        RelayError::Conflict(ConflictReason::Blocked {
            current_uuid: "A".into(),
            status: EventStatus::Scheduled,
        })
    );
    assert_eq!(store.record(&principal()).unwrap(), before);
}

#[tokio::test]
async fn complete_with_other_uuid_leaves_record_unchanged() {
    let (guard, store) = guard_with(EventStatus::Processing, "A");
    let before = store.record(&principal()).unwrap();

    let err = guard.complete(&RelayEvent::new(PRINCIPAL, "B")).await.unwrap_err();

    assert!(err.is_conflict());
    assert!(!err.is_retryable());
    let after = store.record(&principal()).unwrap();
    assert_eq!(after, before);
    assert_eq!(after.status, EventStatus::Processing);
    assert_eq!(after.uuid, "A");
}

#[tokio::test]
async fn complete_requires_processing() {
    let (guard, _store) = guard_with(EventStatus::Scheduled, "A");

    let err = guard.complete(&RelayEvent::new(PRINCIPAL, "A")).await.unwrap_err();

    assert_eq!(
        err,
        RelayError::Conflict(ConflictReason::AlreadyOwned { status: EventStatus::Scheduled })
    );
}

#[tokio::test]
async fn acknowledge_then_complete() {
    let (guard, store) = guard_with(EventStatus::Scheduled, "A");
    let event = RelayEvent::new(PRINCIPAL, "A");

    guard.acknowledge(&event).await.unwrap();
    let record = guard.complete(&event).await.unwrap();

    assert_eq!(record.status, EventStatus::Processed);
    assert_eq!(store.record(&principal()).unwrap().status, EventStatus::Processed);
}

#[tokio::test]
async fn missing_record_is_reported() {
    let guard = EventStateGuard::new(Arc::new(InMemoryEventStore::default()));

    let err = guard.acknowledge(&RelayEvent::new(PRINCIPAL, "A")).await.unwrap_err();

    assert_eq!(err, RelayError::Conflict(ConflictReason::Missing));
}

#[tokio::test]
async fn store_failure_is_not_a_conflict() {
    let (guard, store) = guard_with(EventStatus::Scheduled, "A");
    store.set_unavailable();

    let err = guard.acknowledge(&RelayEvent::new(PRINCIPAL, "A")).await.unwrap_err();

    assert!(matches!(err, RelayError::StoreUnavailable(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn concurrent_acknowledge_has_single_winner() {
    let (guard, _store) = guard_with(EventStatus::Scheduled, "A");
    let event = RelayEvent::new(PRINCIPAL, "A");

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
            Err(err) => assert!(err.is_conflict()),
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn released_event_can_be_claimed_again() {
    let (guard, store) = guard_with(EventStatus::Scheduled, "A");
    let event = RelayEvent::new(PRINCIPAL, "A");

    guard.acknowledge(&event).await.unwrap();
    let released = guard.release(&event).await.unwrap();
    assert_eq!(released.status, EventStatus::Scheduled);

    guard.acknowledge(&event).await.unwrap();
    assert_eq!(store.record(&principal()).unwrap().status, EventStatus::Processing);
}

#[tokio::test]
async fn release_never_reopens_processed_event() {
    let (guard, store) = guard_with(EventStatus::Processed, "A");

    let err = guard.release(&RelayEvent::new(PRINCIPAL, "A")).await.unwrap_err();

    assert_eq!(
        err,
        RelayError::Conflict(ConflictReason::AlreadyOwned { status: EventStatus::Processed })
    );
    assert_eq!(store.record(&principal()).unwrap().status, EventStatus::Processed);
}
