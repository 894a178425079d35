//! Domain types grouped by concern.

pub mod auth;
pub mod event;
pub mod ring;

pub use auth::{
    ChallengeHint, EmailCredential, Grant, GrantMode, GrantPayload, Principal, TokenCredential,
    TokenResponse,
};
pub use event::{AlarmMode, EventRecord, EventStatus, RelayEvent};
pub use ring::{BaseStation, DevicesResponse, Location, LocationModeResponse, LocationsResponse};
