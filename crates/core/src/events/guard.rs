//! Conditional status transitions for event records
//!
//! Each transition is a compare-and-swap on `(status, uuid)`. When the write
//! is rejected the guard classifies why from the record the store reports,
//! without retrying or touching the record again.

use std::sync::Arc;

use chrono::Utc;
use ringrelay_domain::{ConflictReason, EventRecord, EventStatus, RelayError, RelayEvent, Result};
use tracing::{debug, info, warn};

use super::ports::{CompareAndSwapOutcome, EventStore};

/// Guards event ownership across concurrent invocations.
#[derive(Clone)]
pub struct EventStateGuard {
    store: Arc<dyn EventStore>,
}

impl EventStateGuard {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Claim the event: `scheduled -> processing`.
    ///
    /// At most one concurrent caller with the same event gets `Ok`.
    ///
    /// # Errors
    /// `Conflict` when the record is not `scheduled` with this uuid;
    /// `StoreUnavailable` when the store fails.
    pub async fn acknowledge(&self, event: &RelayEvent) -> Result<EventRecord> {
        self.transition(event, EventStatus::Scheduled, EventStatus::Processing).await
    }

    /// Finish the event: `processing -> processed`.
    ///
    /// # Errors
    /// Same as [`Self::acknowledge`].
    pub async fn complete(&self, event: &RelayEvent) -> Result<EventRecord> {
        self.transition(event, EventStatus::Processing, EventStatus::Processed).await
    }

    /// Give up a claim: `processing -> scheduled`, so a redelivery of the
    /// same event can acknowledge it again.
    ///
    /// # Errors
    /// Same as [`Self::acknowledge`].
    pub async fn release(&self, event: &RelayEvent) -> Result<EventRecord> {
        self.transition(event, EventStatus::Processing, EventStatus::Scheduled).await
    }

    /// Apply one guarded transition.
    pub async fn transition(
        &self,
        event: &RelayEvent,
        from: EventStatus,
        to: EventStatus,
    ) -> Result<EventRecord> {
        debug!(principal = %event.principal, uuid = %event.uuid, %from, %to, "event transition");

        let outcome = self
            .store
            .compare_and_swap(&event.principal, &event.uuid, from, to, Utc::now())
            .await?;

        match outcome {
            CompareAndSwapOutcome::Applied(record) => {
                info!(principal = %event.principal, uuid = %event.uuid, status = %to, "event transitioned");
                Ok(record)
            }
            CompareAndSwapOutcome::Rejected { current } => {
                let reason = classify(event, current.as_ref());
                warn!(
                    principal = %event.principal,
                    uuid = %event.uuid,
                    %from,
                    %to,
                    %reason,
                    "event transition rejected"
                );
                Err(RelayError::Conflict(reason))
            }
        }
    }
}

fn classify(event: &RelayEvent, current: Option<&EventRecord>) -> ConflictReason {
    match current {
        None => ConflictReason::Missing,
        Some(record) if record.uuid == event.uuid => {
            ConflictReason::AlreadyOwned { status: record.status }
        }
        Some(record) => {
            ConflictReason::Blocked { current_uuid: record.uuid.clone(), status: record.status }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use ringrelay_domain::Principal;

    use super::*;

    fn record(uuid: &str, status: EventStatus) -> EventRecord {
        EventRecord {
            principal: Principal::new("user-1"),
            uuid: uuid.into(),
            status,
            mode: None,
            delay_secs: 0,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn classify_distinguishes_reasons() {
        let event = RelayEvent::new("user-1", "u-1");

        assert_eq!(classify(&event, None), ConflictReason::Missing);
        assert_eq!(
            classify(&event, Some(&record("u-1", EventStatus::Processing))),
            ConflictReason::AlreadyOwned { status: EventStatus::Processing }
        );
        assert_eq!(
            classify(&event, Some(&record("u-2", EventStatus::Scheduled))),
            ConflictReason::Blocked { current_uuid: "u-2".into(), status: EventStatus::Scheduled }
        );
    }
}
