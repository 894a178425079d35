//! Port interface for the event record store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ringrelay_domain::{EventRecord, EventStatus, Principal, Result};

/// Result of a conditional status write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompareAndSwapOutcome {
    /// The write matched and the record now holds the new status.
    Applied(EventRecord),
    /// The write matched nothing; `current` is the record as read afterwards.
    Rejected { current: Option<EventRecord> },
}

/// Trait for the store that owns event records
///
/// The store is the only synchronisation point between concurrent
/// invocations, so `compare_and_swap` must be a single atomic write.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Set `status` to `to` and stamp `updated_at = at`, only if the record
    /// currently has status `from` and correlation id `uuid`.
    ///
    /// # Errors
    /// `StoreUnavailable` when the store cannot be reached. A non-matching
    /// record is not an error; it is reported as
    /// [`CompareAndSwapOutcome::Rejected`].
    async fn compare_and_swap(
        &self,
        principal: &Principal,
        uuid: &str,
        from: EventStatus,
        to: EventStatus,
        at: DateTime<Utc>,
    ) -> Result<CompareAndSwapOutcome>;

    /// Read the record for `principal`.
    async fn get(&self, principal: &Principal) -> Result<Option<EventRecord>>;

    /// Create or overwrite the record for `principal` (producer side).
    async fn upsert(&self, record: &EventRecord) -> Result<()>;
}
