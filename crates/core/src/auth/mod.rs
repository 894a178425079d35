//! Credential lifecycle: token grants, refresh, and 2FA negotiation

pub mod manager;
pub mod ports;
pub mod resolvers;

pub use manager::{Credential, CredentialManager, RefreshOutcome};
pub use resolvers::{FixedCodeResolver, UnattendedResolver};
