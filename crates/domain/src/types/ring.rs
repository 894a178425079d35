//! Ring API resource types
//!
//! Only the fields the relay reads are modelled; everything else in the
//! responses is ignored.

use serde::{Deserialize, Serialize};

/// A Ring location (a home, usually).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub location_id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationsResponse {
    #[serde(default)]
    pub user_locations: Vec<Location>,
}

/// Alarm base station registered to a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStation {
    pub id: u64,
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
}

/// Subset of `ring_devices`; other device groups are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct DevicesResponse {
    #[serde(default)]
    pub base_stations: Vec<BaseStation>,
}

/// Body of the location mode endpoint (both GET and POST).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationModeResponse {
    pub mode: String,
}
