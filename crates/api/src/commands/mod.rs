//! CLI subcommands
//!
//! Each command returns its result as data; `main` renders it and maps
//! failures to an exit code.

pub mod handle;
pub mod principals;
pub mod register;
pub mod seed;

use ringrelay_domain::RelayError;

/// Exit status for a fatal failure.
pub const EXIT_FAILURE: u8 = 1;

/// Exit status asking the delivery mechanism to retry later (`EX_TEMPFAIL`).
pub const EXIT_RETRY: u8 = 75;

/// Map a command failure to a process exit status.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<RelayError>() {
        Some(relay) if relay.is_retryable() => EXIT_RETRY,
        _ => EXIT_FAILURE,
    }
}
