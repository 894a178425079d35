//! Handle command - process one delivered event.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ringrelay_core::RelayOutcome;
use ringrelay_domain::RelayEvent;
use serde_json::{json, Value};
use tracing::debug;

use crate::context::AppContext;

/// Arguments for the handle command.
#[derive(clap::Args, Debug, Default)]
pub struct HandleArgs {
    /// File holding the delivery envelope. Reads stdin when omitted or "-".
    pub envelope: Option<PathBuf>,

    /// Handle an event for this principal instead of parsing an envelope.
    #[arg(long, requires = "uuid", conflicts_with = "envelope")]
    pub principal: Option<String>,

    /// Correlation id of the event, used with --principal.
    #[arg(long, requires = "principal")]
    pub uuid: Option<String>,
}

/// Runs the handle command.
///
/// A skipped event is a success; only failures make the caller redeliver.
pub async fn run(ctx: &AppContext, args: &HandleArgs) -> Result<RelayOutcome> {
    let event = match (&args.principal, &args.uuid) {
        (Some(principal), Some(uuid)) => RelayEvent::new(principal.clone(), uuid.clone()),
        _ => {
            let envelope = read_envelope(args.envelope.as_deref())?;
            RelayEvent::from_envelope(&envelope)?
        }
    };

    let outcome = ctx.relay_handler().handle(&event).await?;
    Ok(outcome)
}

/// JSON summary printed on stdout.
pub fn report(outcome: &RelayOutcome) -> Value {
    match outcome {
        RelayOutcome::Processed { location_id, base_station_id, previous_mode, mode } => json!({
            "status": "processed",
            "location_id": location_id,
            "base_station_id": base_station_id,
            "previous_mode": previous_mode,
            "mode": mode,
        }),
        RelayOutcome::Skipped { reason } => json!({
            "status": "skipped",
            "reason": reason.to_string(),
        }),
    }
}

fn read_envelope(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => {
            debug!(path = %path.display(), "reading envelope from file");
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read envelope {}", path.display()))
        }
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("failed to read envelope from stdin")?;
            Ok(buf)
        }
    }
}
