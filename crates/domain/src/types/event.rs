//! Event records and the inbound delivery envelope

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::auth::Principal;
use crate::errors::RelayError;

/// Processing status of the event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Scheduled,
    Processing,
    Processed,
}

impl EventStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Processing => "processing",
            Self::Processed => "processed",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "processing" => Ok(Self::Processing),
            "processed" => Ok(Self::Processed),
            other => Err(RelayError::StoreUnavailable(format!("unknown event status '{other}'"))),
        }
    }
}

/// Alarm mode a scheduled event asks the location to switch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmMode {
    Home,
    Away,
    Disarmed,
}

impl AlarmMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Away => "away",
            Self::Disarmed => "disarmed",
        }
    }
}

impl fmt::Display for AlarmMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlarmMode {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "home" => Ok(Self::Home),
            "away" => Ok(Self::Away),
            "disarmed" => Ok(Self::Disarmed),
            other => Err(RelayError::Unsupported(format!("unknown alarm mode '{other}'"))),
        }
    }
}

/// Persisted event record, keyed by principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub principal: Principal,
    /// Correlation id of the event that currently owns the record
    pub uuid: String,
    pub status: EventStatus,
    pub mode: Option<AlarmMode>,
    /// Seconds the producer waited before delivering the event
    pub delay_secs: i64,
    pub updated_at: DateTime<Utc>,
}

/// One delivered event, as extracted from the delivery envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayEvent {
    pub principal: Principal,
    pub uuid: String,
    /// Opaque message body (the upstream request id), kept for logging
    pub body: Option<String>,
}

impl RelayEvent {
    pub fn new(principal: impl Into<String>, uuid: impl Into<String>) -> Self {
        Self { principal: Principal::new(principal), uuid: uuid.into(), body: None }
    }

    /// Parse the first record of a queue delivery envelope.
    ///
    /// Only the `userId` and `uuid` string attributes are required.
    pub fn from_envelope(json: &str) -> Result<Self, RelayError> {
        let envelope: QueueEnvelope = serde_json::from_str(json)
            .map_err(|e| RelayError::InvalidEnvelope(format!("malformed JSON: {e}")))?;

        let record = envelope
            .records
            .into_iter()
            .next()
            .ok_or_else(|| RelayError::InvalidEnvelope("envelope has no records".into()))?;

        let principal = record.attribute("userId")?;
        let uuid = record.attribute("uuid")?;

        Ok(Self { principal: Principal::new(principal), uuid, body: record.body })
    }
}

#[derive(Debug, Deserialize)]
struct QueueEnvelope {
    #[serde(rename = "Records", default)]
    records: Vec<QueueRecord>,
}

#[derive(Debug, Deserialize)]
struct QueueRecord {
    #[serde(rename = "messageAttributes", default)]
    message_attributes: HashMap<String, MessageAttribute>,
    #[serde(default)]
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageAttribute {
    #[serde(rename = "stringValue")]
    string_value: Option<String>,
}

impl QueueRecord {
    fn attribute(&self, name: &str) -> Result<String, RelayError> {
        self.message_attributes
            .get(name)
            .and_then(|attr| attr.string_value.clone())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| RelayError::InvalidEnvelope(format!("missing attribute '{name}'")))
    }
}
