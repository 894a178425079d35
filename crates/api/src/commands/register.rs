//! Register command - exchange email/password for a stored token.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use ringrelay_core::{ChallengeResolver, Credential, FixedCodeResolver, RefreshOutcome};
use ringrelay_domain::{EmailCredential, Principal, TokenCredential};
use ringrelay_infra::ConsoleChallengeResolver;
use tracing::info;
use uuid::Uuid;

use crate::context::AppContext;

/// Arguments for the register command.
#[derive(clap::Args, Debug)]
pub struct RegisterArgs {
    /// Principal the token is stored under.
    #[arg(long)]
    pub principal: String,

    /// Ring account email.
    #[arg(long, env = "RINGRELAY_EMAIL")]
    pub email: String,

    /// Ring account password. Prompted for when not given.
    #[arg(long, env = "RINGRELAY_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Device id sent as `hardware_id`. A random one is generated when omitted.
    #[arg(long)]
    pub hardware_id: Option<String>,

    /// Two-factor code, when already known. Otherwise prompted for on demand.
    #[arg(long)]
    pub code: Option<String>,
}

/// Runs the register command.
///
/// The password is used for a single grant and never stored.
pub async fn run(ctx: &AppContext, args: RegisterArgs) -> Result<TokenCredential> {
    let password = match args.password {
        Some(password) => password,
        None => rpassword::prompt_password("Ring password: ").context("failed to read password")?,
    };

    let resolver: Arc<dyn ChallengeResolver> = match args.code {
        Some(code) => Arc::new(FixedCodeResolver::new(code)),
        None => Arc::new(ConsoleChallengeResolver),
    };

    let credential = Credential::Email {
        credential: EmailCredential {
            email: args.email,
            password,
            hardware_id: args.hardware_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        },
        resolver,
    };

    let principal = Principal::new(args.principal);
    let mut manager = ctx.credential_manager(principal.clone(), credential);

    if let RefreshOutcome::RefreshedUnsaved(err) = manager.ensure_valid().await? {
        return Err(anyhow::Error::new(err).context("token obtained but could not be stored"));
    }

    let token = manager.into_token().ok_or_else(|| anyhow!("password grant returned no token"))?;
    info!(%principal, expires_at = token.expires_at, "principal registered");
    Ok(token)
}
