//! Non-interactive challenge resolvers

use async_trait::async_trait;
use ringrelay_domain::{ChallengeHint, RelayError, Result};
use tracing::debug;

use super::ports::ChallengeResolver;

/// Answers every challenge with a code supplied up front (e.g. `--code`).
#[derive(Clone)]
pub struct FixedCodeResolver {
    code: String,
}

impl FixedCodeResolver {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

impl std::fmt::Debug for FixedCodeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedCodeResolver").field("code", &"<redacted>").finish()
    }
}

#[async_trait]
impl ChallengeResolver for FixedCodeResolver {
    async fn resolve(&self, hint: &ChallengeHint) -> Result<String> {
        debug!(delivery = %hint.describe(), "answering challenge with supplied code");
        Ok(self.code.clone())
    }
}

/// Refuses every challenge; used when no operator is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnattendedResolver;

#[async_trait]
impl ChallengeResolver for UnattendedResolver {
    async fn resolve(&self, hint: &ChallengeHint) -> Result<String> {
        Err(RelayError::ChallengeRequired(hint.clone()))
    }
}
