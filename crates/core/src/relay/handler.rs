//! Relay handler: processes one delivered event end to end
//!
//! Flow:
//! 1. Acknowledge the event (`scheduled -> processing`)
//! 2. Load the stored token and make sure it is valid
//! 3. Resolve the single location and its single base station
//! 4. Switch the location to the requested alarm mode if it differs
//! 5. Complete the event (`processing -> processed`)
//!
//! A retryable failure after step 1 puts the event back to `scheduled`.

use std::sync::Arc;

use ringrelay_domain::constants::{RING_CLIENT_ID, RING_SCOPE};
use ringrelay_domain::{
    ConflictPolicy, ConflictReason, EventRecord, EventStatus, RelayError, RelayEvent, RelayOptions,
    Result,
};
use tracing::{error, info, instrument, warn};

use super::ports::RingApi;
use crate::auth::ports::{CredentialStore, TokenGrantClient, TokenSink};
use crate::auth::{Credential, CredentialManager, RefreshOutcome};
use crate::events::ports::EventStore;
use crate::events::EventStateGuard;

/// Outcome of handling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The event ran to completion.
    Processed {
        location_id: String,
        base_station_id: u64,
        /// Mode reported before any change
        previous_mode: String,
        /// Mode reported after the handler finished
        mode: String,
    },
    /// Another invocation owns the event, or it is blocked; nothing was done.
    Skipped { reason: ConflictReason },
}

impl RelayOutcome {
    #[must_use]
    pub const fn is_processed(&self) -> bool {
        matches!(self, Self::Processed { .. })
    }
}

/// Capabilities the handler is wired with.
///
/// `credentials` and `sink` are usually the same store.
#[derive(Clone)]
pub struct RelayPorts {
    pub events: Arc<dyn EventStore>,
    pub credentials: Arc<dyn CredentialStore>,
    pub sink: Arc<dyn TokenSink>,
    pub grant_client: Arc<dyn TokenGrantClient>,
    pub ring: Arc<dyn RingApi>,
}

pub struct RelayHandler {
    ports: RelayPorts,
    guard: EventStateGuard,
    options: RelayOptions,
    client_id: String,
    scope: String,
}

impl RelayHandler {
    pub fn new(ports: RelayPorts, options: RelayOptions) -> Self {
        let guard = EventStateGuard::new(Arc::clone(&ports.events));
        Self {
            ports,
            guard,
            options,
            client_id: RING_CLIENT_ID.to_string(),
            scope: RING_SCOPE.to_string(),
        }
    }

    /// OAuth client identity forwarded to every credential manager.
    #[must_use]
    pub fn with_client_identity(
        mut self,
        client_id: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        self.client_id = client_id.into();
        self.scope = scope.into();
        self
    }

    /// Parse a queue delivery envelope and handle its first record.
    ///
    /// # Errors
    /// `InvalidEnvelope` for a malformed envelope, otherwise as
    /// [`Self::handle`].
    pub async fn handle_envelope(&self, envelope: &str) -> Result<RelayOutcome> {
        let event = RelayEvent::from_envelope(envelope)?;
        self.handle(&event).await
    }

    /// Process one event.
    ///
    /// # Errors
    /// - `Conflict` on acknowledge under [`ConflictPolicy::Fail`], or when
    ///   the record is still `processing` under this uuid
    /// - `NotFound` when the principal has no stored token
    /// - `Unsupported` for zero or several locations or base stations
    /// - any token or Ring API failure, kind intact
    #[instrument(skip(self, event), fields(principal = %event.principal, uuid = %event.uuid))]
    pub async fn handle(&self, event: &RelayEvent) -> Result<RelayOutcome> {
        info!(body = event.body.as_deref().unwrap_or(""), "handling event");

        let record = match self.claim(event).await {
            Ok(record) => record,
            Err(RelayError::Conflict(reason)) if self.skips(&reason) => {
                info!(%reason, "skipping event");
                return Ok(RelayOutcome::Skipped { reason });
            }
            Err(err) => return Err(err),
        };

        match self.process(event, record.as_ref()).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                if self.options.guard_events && err.is_retryable() {
                    self.release(event).await;
                }
                Err(err)
            }
        }
    }

    /// Everything after the claim, up to and including `complete`.
    async fn process(&self, event: &RelayEvent, record: Option<&EventRecord>) -> Result<RelayOutcome> {
        let token = self
            .ports
            .credentials
            .load(&event.principal)
            .await?
            .ok_or_else(|| {
                RelayError::NotFound(format!("no stored token for principal {}", event.principal))
            })?;

        let mut manager = CredentialManager::new(
            event.principal.clone(),
            Credential::Token(token),
            Arc::clone(&self.ports.grant_client),
            Arc::clone(&self.ports.sink),
        )
        .with_client_identity(self.client_id.clone(), self.scope.clone())
        .with_refresh_buffer(self.options.refresh_buffer_secs);

        if let RefreshOutcome::RefreshedUnsaved(err) = manager.ensure_valid().await? {
            warn!(error = %err, "continuing with a token that was not persisted");
        }
        let token = manager
            .into_token()
            .ok_or_else(|| RelayError::client("credential manager holds no token"))?;

        let mut locations = self.ports.ring.locations(&token).await?;
        if locations.len() != 1 {
            error!(count = locations.len(), "exactly one location is supported");
            return Err(RelayError::Unsupported(format!(
                "found {} locations, exactly one is supported",
                locations.len()
            )));
        }
        let location = locations.remove(0);
        let location_id = location.location_id;

        let previous_mode = self.ports.ring.location_mode(&token, &location_id).await?;

        let base_stations: Vec<_> = self
            .ports
            .ring
            .base_stations(&token)
            .await?
            .into_iter()
            .filter(|bs| bs.location_id.as_deref() == Some(location_id.as_str()))
            .collect();
        let [base_station] = base_stations.as_slice() else {
            error!(count = base_stations.len(), %location_id, "exactly one base station is supported");
            return Err(RelayError::Unsupported(format!(
                "found {} base stations at location {location_id}, exactly one is supported",
                base_stations.len()
            )));
        };
        let base_station_id = base_station.id;

        let mode = match record.and_then(|r| r.mode) {
            Some(requested) if requested.as_str() != previous_mode => {
                info!(%location_id, from = %previous_mode, to = %requested, "switching alarm mode");
                self.ports.ring.set_location_mode(&token, &location_id, requested).await?
            }
            _ => previous_mode.clone(),
        };

        if self.options.guard_events {
            self.guard.complete(event).await?;
        }

        info!(%location_id, base_station_id, %mode, "event processed");
        Ok(RelayOutcome::Processed { location_id, base_station_id, previous_mode, mode })
    }

    /// Whether a rejected acknowledge ends the event successfully.
    ///
    /// A record still `processing` under this uuid belongs to an invocation
    /// that failed or is still running, so it is never skipped.
    fn skips(&self, reason: &ConflictReason) -> bool {
        self.options.conflict_policy == ConflictPolicy::Skip
            && !matches!(reason, ConflictReason::AlreadyOwned { status: EventStatus::Processing })
    }

    /// Hand the event back after a retryable failure so redelivery can claim it.
    async fn release(&self, event: &RelayEvent) {
        match self.guard.release(event).await {
            Ok(_) => info!("event released for redelivery"),
            Err(err) => warn!(error = %err, "could not release event"),
        }
    }

    /// Acknowledge the event, or just read the record when guarding is off.
    async fn claim(&self, event: &RelayEvent) -> Result<Option<EventRecord>> {
        if self.options.guard_events {
            self.guard.acknowledge(event).await.map(Some)
        } else {
            let record = self.ports.events.get(&event.principal).await?;
            Ok(record.filter(|r| r.uuid == event.uuid))
        }
    }
}
