//! Credential lifecycle manager
//!
//! Owns the authentication state of one principal for the lifetime of an
//! invocation:
//! - Skips the token endpoint while the current token is fresh
//! - Builds password or refresh grants depending on the current state
//! - Negotiates at most one 2FA challenge, and only for password grants
//! - Hands every newly issued token to the persistence capability

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use ringrelay_domain::constants::{
    HEADER_2FA_CODE, HEADER_2FA_SUPPORT, HEADER_HARDWARE_ID, REFRESH_BUFFER_SECS, RING_CLIENT_ID,
    RING_SCOPE,
};
use ringrelay_domain::{
    EmailCredential, Grant, GrantMode, GrantPayload, Principal, RelayError, Result,
    TokenCredential, TokenResponse,
};
use tracing::{debug, error, info, warn};

use super::ports::{ChallengeResolver, TokenGrantClient, TokenSink};

/// Credential supplied when the manager is constructed
pub enum Credential {
    /// Email/password pair plus the capability that answers 2FA challenges
    Email { credential: EmailCredential, resolver: Arc<dyn ChallengeResolver> },
    /// Previously issued token pair
    Token(TokenCredential),
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email { credential, .. } => {
                f.debug_struct("Email").field("credential", credential).finish_non_exhaustive()
            }
            Self::Token(token) => f.debug_tuple("Token").field(token).finish(),
        }
    }
}

/// Result of [`CredentialManager::ensure_valid`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum RefreshOutcome {
    /// The current token is outside the refresh window; nothing was sent.
    StillValid,
    /// A new token was issued and persisted.
    Refreshed,
    /// A new token was issued and is in use, but persisting it failed.
    RefreshedUnsaved(RelayError),
}

enum AuthState {
    Unauthenticated { credential: EmailCredential, resolver: Arc<dyn ChallengeResolver> },
    Authenticated(TokenCredential),
}

/// Per-call request state; dropped when `ensure_valid` returns.
struct AuthAttempt {
    payload: GrantPayload,
    headers: BTreeMap<String, String>,
    challenge_attempted: bool,
}

/// Token lifecycle manager for a single principal
///
/// The grant mode is derived from the state: password while
/// unauthenticated, refresh token once any grant succeeded. The state never
/// returns to unauthenticated, so a manager never re-sends the password.
pub struct CredentialManager {
    principal: Principal,
    grant_client: Arc<dyn TokenGrantClient>,
    sink: Arc<dyn TokenSink>,
    state: AuthState,
    client_id: String,
    scope: String,
    refresh_buffer_secs: i64,
}

impl CredentialManager {
    /// Create a manager starting from `credential`.
    ///
    /// # Arguments
    /// * `principal` - Account the token belongs to (persistence key)
    /// * `credential` - Email credential (password grant) or stored token
    ///   (refresh grant)
    /// * `grant_client` - Token endpoint
    /// * `sink` - Persistence capability called after each successful grant
    pub fn new(
        principal: Principal,
        credential: Credential,
        grant_client: Arc<dyn TokenGrantClient>,
        sink: Arc<dyn TokenSink>,
    ) -> Self {
        let state = match credential {
            Credential::Email { credential, resolver } => {
                AuthState::Unauthenticated { credential, resolver }
            }
            Credential::Token(token) => AuthState::Authenticated(token),
        };

        Self {
            principal,
            grant_client,
            sink,
            state,
            client_id: RING_CLIENT_ID.to_string(),
            scope: RING_SCOPE.to_string(),
            refresh_buffer_secs: REFRESH_BUFFER_SECS,
        }
    }

    /// Override the OAuth client id and scope sent with every grant.
    #[must_use]
    pub fn with_client_identity(mut self, client_id: impl Into<String>, scope: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self.scope = scope.into();
        self
    }

    /// Override the refresh window (seconds before expiry).
    #[must_use]
    pub const fn with_refresh_buffer(mut self, seconds: i64) -> Self {
        self.refresh_buffer_secs = seconds;
        self
    }

    pub const fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Grant type the next token request would use.
    pub const fn grant_mode(&self) -> GrantMode {
        match self.state {
            AuthState::Unauthenticated { .. } => GrantMode::Password,
            AuthState::Authenticated(_) => GrantMode::RefreshToken,
        }
    }

    pub const fn is_authenticated(&self) -> bool {
        matches!(self.state, AuthState::Authenticated(_))
    }

    /// Current token, without refreshing.
    pub const fn token(&self) -> Option<&TokenCredential> {
        match &self.state {
            AuthState::Authenticated(token) => Some(token),
            AuthState::Unauthenticated { .. } => None,
        }
    }

    /// Consume the manager and hand back the current token value.
    pub fn into_token(self) -> Option<TokenCredential> {
        match self.state {
            AuthState::Authenticated(token) => Some(token),
            AuthState::Unauthenticated { .. } => None,
        }
    }

    /// Make sure the held token stays valid for longer than the refresh
    /// window, requesting a new one otherwise.
    ///
    /// # Errors
    /// Propagates the grant failure with its kind intact; the state is left
    /// unchanged on error.
    pub async fn ensure_valid(&mut self) -> Result<RefreshOutcome> {
        let now = Utc::now().timestamp();
        if let AuthState::Authenticated(token) = &self.state {
            if token.is_fresh(now, self.refresh_buffer_secs) {
                debug!(
                    principal = %self.principal,
                    expires_in = token.seconds_until_expiry(now),
                    "token still valid, skipping refresh"
                );
                return Ok(RefreshOutcome::StillValid);
            }
        }

        let grant_mode = self.grant_mode();
        info!(principal = %self.principal, %grant_mode, "requesting new token");

        let mut attempt = self.begin_attempt();
        let response = self.execute(&mut attempt).await.inspect_err(|err| {
            warn!(
                principal = %self.principal,
                %grant_mode,
                error_kind = err.kind(),
                error = %err,
                "token grant failed"
            );
        })?;

        let hardware_id = self.hardware_id().to_string();
        let token = TokenCredential::from_response(response, Utc::now().timestamp(), hardware_id);
        self.state = AuthState::Authenticated(token.clone());
        info!(principal = %self.principal, expires_at = token.expires_at, "token acquired");

        match self.sink.save(&self.principal, &token).await {
            Ok(()) => Ok(RefreshOutcome::Refreshed),
            Err(err) => {
                error!(principal = %self.principal, error = %err, "failed to persist refreshed token");
                Ok(RefreshOutcome::RefreshedUnsaved(err))
            }
        }
    }

    /// Bearer token for API calls, refreshing first when needed.
    ///
    /// A persistence failure during the refresh is logged by
    /// [`Self::ensure_valid`] and does not fail this call.
    ///
    /// # Errors
    /// Same as [`Self::ensure_valid`].
    pub async fn access_token(&mut self) -> Result<String> {
        let _ = self.ensure_valid().await?;
        self.token()
            .map(|token| token.access_token.clone())
            .ok_or_else(|| RelayError::client("no token available after refresh"))
    }

    fn hardware_id(&self) -> &str {
        match &self.state {
            AuthState::Unauthenticated { credential, .. } => &credential.hardware_id,
            AuthState::Authenticated(token) => &token.hardware_id,
        }
    }

    fn begin_attempt(&self) -> AuthAttempt {
        let grant = match &self.state {
            AuthState::Unauthenticated { credential, .. } => Grant::Password {
                username: credential.email.clone(),
                password: credential.password.clone(),
            },
            AuthState::Authenticated(token) => {
                Grant::RefreshToken { refresh_token: token.refresh_token.clone() }
            }
        };

        let mut headers = BTreeMap::new();
        headers.insert(HEADER_HARDWARE_ID.to_string(), self.hardware_id().to_string());
        headers.insert(HEADER_2FA_SUPPORT.to_string(), "true".to_string());

        AuthAttempt {
            payload: GrantPayload {
                client_id: self.client_id.clone(),
                scope: self.scope.clone(),
                grant,
            },
            headers,
            challenge_attempted: false,
        }
    }

    /// Send the grant, answering at most one 2FA challenge.
    async fn execute(&self, attempt: &mut AuthAttempt) -> Result<TokenResponse> {
        let hint = match self.grant_client.request_token(&attempt.payload, &attempt.headers).await
        {
            Err(RelayError::ChallengeRequired(hint)) => hint,
            other => return other,
        };

        // Challenges are only negotiable while establishing a password session.
        let resolver = match &self.state {
            AuthState::Unauthenticated { resolver, .. } if !attempt.challenge_attempted => {
                Arc::clone(resolver)
            }
            _ => return Err(RelayError::ChallengeRequired(hint)),
        };

        info!(principal = %self.principal, delivery = %hint.describe(), "two-factor challenge received");
        let code = resolver.resolve(&hint).await?;
        attempt.headers.insert(HEADER_2FA_CODE.to_string(), code);
        attempt.challenge_attempted = true;

        self.grant_client.request_token(&attempt.payload, &attempt.headers).await
    }
}
