//! Port interfaces for credential management
//!
//! These traits define the boundaries between the credential lifecycle
//! manager and the infrastructure that talks to the OAuth endpoint, persists
//! tokens, and answers 2FA challenges.

use std::collections::BTreeMap;

use async_trait::async_trait;
use ringrelay_domain::{ChallengeHint, GrantPayload, Principal, Result, TokenCredential, TokenResponse};

/// Trait for the OAuth token endpoint
#[async_trait]
pub trait TokenGrantClient: Send + Sync {
    /// Post one grant request.
    ///
    /// # Errors
    /// - `ChallengeRequired` when the endpoint answers HTTP 412
    /// - `Transient` once the caller's retry budget is exhausted
    /// - `Client` for any other rejection or an undecodable body
    async fn request_token(
        &self,
        payload: &GrantPayload,
        headers: &BTreeMap<String, String>,
    ) -> Result<TokenResponse>;
}

/// Persistence capability invoked after every successful token acquisition
#[async_trait]
pub trait TokenSink: Send + Sync {
    /// Store `token` for `principal`, overwriting any previous record.
    async fn save(&self, principal: &Principal, token: &TokenCredential) -> Result<()>;
}

/// Read side of the credential store
///
/// Writes go through [`TokenSink::save`].
#[async_trait]
pub trait CredentialStore: TokenSink {
    /// Load the stored token for `principal`, if any.
    async fn load(&self, principal: &Principal) -> Result<Option<TokenCredential>>;

    /// List every principal that has a stored token.
    async fn list_principals(&self) -> Result<Vec<Principal>>;
}

/// Capability that turns a 2FA challenge into a code
///
/// Implementations may prompt on a console, return a pre-supplied code, or
/// refuse outright when running unattended.
#[async_trait]
pub trait ChallengeResolver: Send + Sync {
    /// Produce the code for `hint`. Blocks the current invocation until a
    /// code is available.
    async fn resolve(&self, hint: &ChallengeHint) -> Result<String>;
}
