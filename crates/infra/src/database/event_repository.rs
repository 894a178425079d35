//! Event records with guarded status updates
//!
//! The conditional write is a single `UPDATE ... WHERE principal = ? AND
//! status = ? AND uuid = ? RETURNING ...`, so SQLite's write lock is the only
//! synchronisation between concurrent invocations.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ringrelay_core::{CompareAndSwapOutcome, EventStore};
use ringrelay_domain::{EventRecord, EventStatus, Principal, RelayError, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::task;

use super::manager::DbManager;
use super::{map_join_error, map_sql_error};

const EVENT_COLUMNS: &str = "principal, uuid, status, mode, delay_secs, updated_at";

/// SQLite-backed event store
pub struct SqliteEventStore {
    db: Arc<DbManager>,
}

impl SqliteEventStore {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EventStore for SqliteEventStore {
    async fn compare_and_swap(
        &self,
        principal: &Principal,
        uuid: &str,
        from: EventStatus,
        to: EventStatus,
        at: DateTime<Utc>,
    ) -> Result<CompareAndSwapOutcome> {
        let db = Arc::clone(&self.db);
        let principal = principal.clone();
        let uuid = uuid.to_string();

        task::spawn_blocking(move || -> Result<CompareAndSwapOutcome> {
            let conn = db.get_connection()?;
            let updated = conn
                .query_row(
                    &format!(
                        "UPDATE events SET status = ?1, updated_at = ?2
                         WHERE principal = ?3 AND status = ?4 AND uuid = ?5
                         RETURNING {EVENT_COLUMNS}"
                    ),
                    params![
                        to.as_str(),
                        at.timestamp_millis(),
                        principal.as_str(),
                        from.as_str(),
                        uuid
                    ],
                    EventRow::from_row,
                )
                .optional()
                .map_err(map_sql_error)?;

            match updated {
                Some(row) => Ok(CompareAndSwapOutcome::Applied(row.into_record()?)),
                None => {
                    let current = select_event(&conn, &principal)?;
                    Ok(CompareAndSwapOutcome::Rejected { current })
                }
            }
        })
        .await
        .map_err(map_join_error)?
    }

    async fn get(&self, principal: &Principal) -> Result<Option<EventRecord>> {
        let db = Arc::clone(&self.db);
        let principal = principal.clone();

        task::spawn_blocking(move || -> Result<Option<EventRecord>> {
            let conn = db.get_connection()?;
            select_event(&conn, &principal)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn upsert(&self, record: &EventRecord) -> Result<()> {
        let db = Arc::clone(&self.db);
        let record = record.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO events (principal, uuid, status, mode, delay_secs, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(principal) DO UPDATE SET
                    uuid = excluded.uuid,
                    status = excluded.status,
                    mode = excluded.mode,
                    delay_secs = excluded.delay_secs,
                    updated_at = excluded.updated_at",
                params![
                    record.principal.as_str(),
                    record.uuid,
                    record.status.as_str(),
                    record.mode.map(|m| m.as_str()),
                    record.delay_secs,
                    record.updated_at.timestamp_millis(),
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

fn select_event(conn: &Connection, principal: &Principal) -> Result<Option<EventRecord>> {
    conn.query_row(
        &format!("SELECT {EVENT_COLUMNS} FROM events WHERE principal = ?1"),
        params![principal.as_str()],
        EventRow::from_row,
    )
    .optional()
    .map_err(map_sql_error)?
    .map(EventRow::into_record)
    .transpose()
}

/// Raw column values, validated into an [`EventRecord`] afterwards.
struct EventRow {
    principal: String,
    uuid: String,
    status: String,
    mode: Option<String>,
    delay_secs: i64,
    updated_at: i64,
}

impl EventRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            principal: row.get(0)?,
            uuid: row.get(1)?,
            status: row.get(2)?,
            mode: row.get(3)?,
            delay_secs: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn into_record(self) -> Result<EventRecord> {
        let mode = self
            .mode
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|e: RelayError| RelayError::StoreUnavailable(e.to_string()))?;
        let updated_at = DateTime::from_timestamp_millis(self.updated_at).ok_or_else(|| {
            RelayError::StoreUnavailable(format!("invalid updated_at {}", self.updated_at))
        })?;

        Ok(EventRecord {
            principal: Principal::new(self.principal),
            uuid: self.uuid,
            status: self.status.parse()?,
            mode,
            delay_secs: self.delay_secs,
            updated_at,
        })
    }
}
