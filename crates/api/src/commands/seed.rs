//! Seed command - write a scheduled event record.
//!
//! Stands in for the producer that schedules events, so a delivery can be
//! replayed locally against a real account.

use anyhow::Result;
use chrono::Utc;
use ringrelay_core::EventStore;
use ringrelay_domain::{AlarmMode, EventRecord, EventStatus, Principal};
use tracing::info;
use uuid::Uuid;

use crate::context::AppContext;

/// Arguments for the seed command.
#[derive(clap::Args, Debug)]
pub struct SeedArgs {
    /// Principal that owns the record.
    #[arg(long)]
    pub principal: String,

    /// Alarm mode the event should switch to (home, away, disarmed).
    #[arg(long)]
    pub mode: AlarmMode,

    /// Correlation id. A random one is generated when omitted.
    #[arg(long)]
    pub uuid: Option<String>,

    /// Seconds the producer waited before delivery.
    #[arg(long, default_value_t = 0)]
    pub delay_secs: i64,
}

/// Runs the seed command. Any existing record for the principal is replaced.
pub async fn run(ctx: &AppContext, args: SeedArgs) -> Result<EventRecord> {
    let record = EventRecord {
        principal: Principal::new(args.principal),
        uuid: args.uuid.unwrap_or_else(|| Uuid::new_v4().to_string()),
        status: EventStatus::Scheduled,
        mode: Some(args.mode),
        delay_secs: args.delay_secs,
        updated_at: Utc::now(),
    };

    ctx.events.upsert(&record).await?;
    info!(principal = %record.principal, uuid = %record.uuid, mode = %args.mode, "event scheduled");
    Ok(record)
}
