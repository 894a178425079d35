//! Interactive challenge resolution on the controlling terminal

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use ringrelay_core::ChallengeResolver;
use ringrelay_domain::{ChallengeHint, RelayError, Result};
use tokio::task;

/// Prompts on stderr and reads the code from stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleChallengeResolver;

#[async_trait]
impl ChallengeResolver for ConsoleChallengeResolver {
    async fn resolve(&self, hint: &ChallengeHint) -> Result<String> {
        let prompt = format!("Two-factor authentication: {}. Enter code: ", hint.describe());

        task::spawn_blocking(move || read_code(&prompt, io::stdin().lock(), io::stderr()))
            .await
            .map_err(|e| RelayError::client(format!("challenge prompt failed: {e}")))?
    }
}

fn read_code(prompt: &str, mut input: impl BufRead, mut output: impl Write) -> Result<String> {
    let io_error = |e: io::Error| RelayError::client(format!("challenge prompt failed: {e}"));

    output.write_all(prompt.as_bytes()).map_err(io_error)?;
    output.flush().map_err(io_error)?;

    let mut line = String::new();
    input.read_line(&mut line).map_err(io_error)?;
    let code = line.trim();
    if code.is_empty() {
        return Err(RelayError::client("no two-factor code entered"));
    }
    Ok(code.to_string())
}
