//! # RingRelay Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for the token endpoint, credential
//!   store, event store and Ring API
//! - The credential lifecycle manager (password/refresh grants, 2FA)
//! - The event state guard (compare-and-swap acknowledge/complete)
//! - The relay handler that wires them together for one event
//!
//! ## Architecture Principles
//! - Only depends on `ringrelay-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod auth;
pub mod events;
pub mod relay;

// Re-export specific items to avoid ambiguity
pub use auth::ports::{ChallengeResolver, CredentialStore, TokenGrantClient, TokenSink};
pub use auth::{
    Credential, CredentialManager, FixedCodeResolver, RefreshOutcome, UnattendedResolver,
};
pub use events::ports::{CompareAndSwapOutcome, EventStore};
pub use events::EventStateGuard;
pub use relay::ports::RingApi;
pub use relay::handler::RelayPorts;
pub use relay::{RelayHandler, RelayOutcome};
