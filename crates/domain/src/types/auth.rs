//! Credential types for the Ring OAuth endpoint
//!
//! A principal authenticates either with an email/password pair (first
//! registration, possibly behind a 2FA challenge) or with a previously issued
//! refresh token. Both shapes are modelled here; the capability that answers
//! 2FA challenges lives in `ringrelay-core`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Account identifier; key for both the token record and the event record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Principal {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Email/password credential used for the initial password grant.
#[derive(Clone, PartialEq, Eq)]
pub struct EmailCredential {
    pub email: String,
    pub password: String,
    /// Device identifier sent as the `hardware_id` header
    pub hardware_id: String,
}

impl fmt::Debug for EmailCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailCredential")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("hardware_id", &self.hardware_id)
            .finish()
    }
}

/// Access/refresh token pair as persisted in the credential store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCredential {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub scope: String,
    /// Absolute expiry, epoch seconds
    pub expires_at: i64,
    pub hardware_id: String,
}

impl TokenCredential {
    /// Build a credential from a token response received at `now`.
    #[must_use]
    pub fn from_response(response: TokenResponse, now: i64, hardware_id: String) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            token_type: response.token_type,
            scope: response.scope,
            expires_at: now.saturating_add(response.expires_in),
            hardware_id,
        }
    }

    /// True while the token stays valid for more than `buffer_secs` past
    /// `now`.
    #[must_use]
    pub const fn is_fresh(&self, now: i64, buffer_secs: i64) -> bool {
        self.expires_at > now.saturating_add(buffer_secs)
    }

    #[must_use]
    pub const fn seconds_until_expiry(&self, now: i64) -> i64 {
        self.expires_at.saturating_sub(now)
    }
}

impl fmt::Debug for TokenCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCredential")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("expires_at", &self.expires_at)
            .field("hardware_id", &self.hardware_id)
            .finish()
    }
}

/// Successful response from the OAuth token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Lifetime in seconds
    pub expires_in: i64,
    pub refresh_token: String,
    pub scope: String,
    pub token_type: String,
}

/// Body of the HTTP 412 challenge response.
///
/// Seen shapes: `{"next_time_in_secs": 60, "phone": "+1xxxxxxxx12",
/// "tsv_state": "sms"}` and `{"phone": "time-based OTP", "tsv_state":
/// "totp"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeHint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_time_in_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tsv_state: Option<String>,
}

impl ChallengeHint {
    /// Human readable description of where the code was delivered.
    #[must_use]
    pub fn describe(&self) -> String {
        let target = self.phone.as_deref().unwrap_or("unknown destination");
        match self.tsv_state.as_deref() {
            Some("sms") => format!("code sent by SMS to {target}"),
            Some("totp") => format!("code from authenticator app ({target})"),
            Some("email") => format!("code sent by email to {target}"),
            Some(other) => format!("{other} code for {target}"),
            None => "code required".to_string(),
        }
    }
}

/// Which grant the credential manager uses for its next token request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantMode {
    Password,
    RefreshToken,
}

impl fmt::Display for GrantMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password => f.write_str("password"),
            Self::RefreshToken => f.write_str("refresh_token"),
        }
    }
}

/// Grant-specific fields of the token request body.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "grant_type", rename_all = "snake_case")]
pub enum Grant {
    Password { username: String, password: String },
    RefreshToken { refresh_token: String },
}

impl Grant {
    #[must_use]
    pub const fn mode(&self) -> GrantMode {
        match self {
            Self::Password { .. } => GrantMode::Password,
            Self::RefreshToken { .. } => GrantMode::RefreshToken,
        }
    }
}

impl fmt::Debug for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password { username, .. } => {
                f.debug_struct("Password").field("username", username).finish_non_exhaustive()
            }
            Self::RefreshToken { .. } => f.debug_struct("RefreshToken").finish_non_exhaustive(),
        }
    }
}

/// Complete JSON body posted to the OAuth endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrantPayload {
    pub client_id: String,
    pub scope: String,
    #[serde(flatten)]
    pub grant: Grant,
}
