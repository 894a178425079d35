//! Principals command - list stored credentials.

use anyhow::Result;
use chrono::Utc;
use ringrelay_core::CredentialStore;
use ringrelay_domain::Principal;

use crate::context::AppContext;

/// One stored credential, without its secrets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalSummary {
    pub principal: Principal,
    pub expires_at: i64,
    /// Negative once the access token has expired
    pub expires_in: i64,
    pub hardware_id: String,
}

/// Runs the principals command.
pub async fn run(ctx: &AppContext) -> Result<Vec<PrincipalSummary>> {
    let now = Utc::now().timestamp();
    let mut summaries = Vec::new();

    for principal in ctx.credentials.list_principals().await? {
        // Rows can disappear between the listing and the load.
        if let Some(token) = ctx.credentials.load(&principal).await? {
            summaries.push(PrincipalSummary {
                principal,
                expires_at: token.expires_at,
                expires_in: token.seconds_until_expiry(now),
                hardware_id: token.hardware_id,
            });
        }
    }

    Ok(summaries)
}
