//! RingRelay - relays scheduled alarm-mode events to a Ring account.
//!
//! # Examples
//!
//! ```bash
//! # Store a token for a principal (prompts for password and 2FA code)
//! ringrelay register --principal user-1 --email owner@example.com
//!
//! # Schedule an event, then handle its delivery
//! ringrelay seed --principal user-1 --mode away --uuid evt-1
//! ringrelay handle --principal user-1 --uuid evt-1
//!
//! # Handle a queue delivery envelope from stdin
//! ringrelay handle < envelope.json
//! ```
//!
//! Exit status: 0 when the event was processed or skipped, 75 when the
//! failure is worth redelivering, 1 otherwise.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ringrelay_app::commands::{self, handle, principals, register, seed};
use ringrelay_app::AppContext;
use ringrelay_infra::{config, init_tracing, LogFormat};
use serde_json::{json, Value};
use tracing::{debug, error};

/// RingRelay - scheduled alarm-mode relay.
#[derive(Parser)]
#[command(name = "ringrelay")]
#[command(about = "Relay scheduled alarm-mode events to a Ring account")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (TOML or JSON). Environment and probed files are
    /// used when omitted.
    #[arg(long, short, global = true, env = "RINGRELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit one JSON object per log line.
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Verbose output (debug logs for ringrelay crates).
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Handle one delivered event.
    Handle(handle::HandleArgs),

    /// Obtain and store a token with email and password.
    Register(register::RegisterArgs),

    /// List principals with a stored token.
    Principals,

    /// Write a scheduled event record.
    Seed(seed::SeedArgs),
}

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    let format = if cli.json_logs { LogFormat::Json } else { LogFormat::Pretty };
    let directive = if cli.verbose { "ringrelay=debug,info" } else { "info" };
    if let Err(err) = init_tracing(format, directive) {
        eprintln!("Error: {err}");
        return ExitCode::from(commands::EXIT_FAILURE);
    }

    match dotenv {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(err) => debug!(error = %err, "no .env loaded"),
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = commands::exit_code(&err);
            error!(error = %format!("{err:#}"), exit_code = code, "command failed");
            ExitCode::from(code)
        }
    }
}

#[allow(clippy::print_stdout)]
async fn run(cli: Cli) -> Result<()> {
    let config = config::load(cli.config)?;
    let ctx = AppContext::new(config)?;

    let output: Value = match cli.command {
        Commands::Handle(args) => handle::report(&handle::run(&ctx, &args).await?),
        Commands::Register(args) => {
            let token = register::run(&ctx, args).await?;
            json!({ "expires_at": token.expires_at, "hardware_id": token.hardware_id })
        }
        Commands::Principals => {
            let summaries = principals::run(&ctx).await?;
            summaries
                .iter()
                .map(|s| {
                    json!({
                        "principal": s.principal.as_str(),
                        "expires_at": s.expires_at,
                        "expires_in": s.expires_in,
                        "hardware_id": s.hardware_id,
                    })
                })
                .collect()
        }
        Commands::Seed(args) => serde_json::to_value(seed::run(&ctx, args).await?)?,
    };

    println!("{output}");
    Ok(())
}
