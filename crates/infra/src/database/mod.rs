//! SQLite-backed stores

pub mod credential_repository;
pub mod event_repository;
pub mod manager;

pub use credential_repository::SqliteCredentialStore;
pub use event_repository::SqliteEventStore;
pub use manager::{DbManager, SqliteConnection, SqlitePool};

use ringrelay_domain::RelayError;
use tokio::task;

use crate::errors::InfraError;

fn map_sql_error(err: rusqlite::Error) -> RelayError {
    RelayError::from(InfraError::from(err))
}

fn map_join_error(err: task::JoinError) -> RelayError {
    if err.is_cancelled() {
        RelayError::StoreUnavailable("blocking database task cancelled".into())
    } else {
        RelayError::StoreUnavailable(format!("blocking database task failed: {err}"))
    }
}
