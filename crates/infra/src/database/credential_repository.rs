//! Token records keyed by principal

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use ringrelay_core::{CredentialStore, TokenSink};
use ringrelay_domain::{Principal, Result, TokenCredential};
use rusqlite::{params, OptionalExtension, Row};
use tokio::task;
use tracing::debug;

use super::manager::DbManager;
use super::{map_join_error, map_sql_error};

/// SQLite-backed credential store
pub struct SqliteCredentialStore {
    db: Arc<DbManager>,
}

impl SqliteCredentialStore {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenSink for SqliteCredentialStore {
    async fn save(&self, principal: &Principal, token: &TokenCredential) -> Result<()> {
        let db = Arc::clone(&self.db);
        let principal = principal.clone();
        let token = token.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO credentials
                    (principal, access_token, refresh_token, token_type, scope, expires_at,
                     hardware_id, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(principal) DO UPDATE SET
                    access_token = excluded.access_token,
                    refresh_token = excluded.refresh_token,
                    token_type = excluded.token_type,
                    scope = excluded.scope,
                    expires_at = excluded.expires_at,
                    hardware_id = excluded.hardware_id,
                    updated_at = excluded.updated_at",
                params![
                    principal.as_str(),
                    token.access_token,
                    token.refresh_token,
                    token.token_type,
                    token.scope,
                    token.expires_at,
                    token.hardware_id,
                    Utc::now().timestamp_millis(),
                ],
            )
            .map_err(map_sql_error)?;
            debug!(principal = %principal, expires_at = token.expires_at, "token saved");
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn load(&self, principal: &Principal) -> Result<Option<TokenCredential>> {
        let db = Arc::clone(&self.db);
        let principal = principal.clone();

        task::spawn_blocking(move || -> Result<Option<TokenCredential>> {
            let conn = db.get_connection()?;
            conn.query_row(
                "SELECT access_token, refresh_token, token_type, scope, expires_at, hardware_id
                 FROM credentials WHERE principal = ?1",
                params![principal.as_str()],
                map_token_row,
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_principals(&self) -> Result<Vec<Principal>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Vec<Principal>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare("SELECT principal FROM credentials ORDER BY principal")
                .map_err(map_sql_error)?;
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0).map(Principal::new))
                .map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn map_token_row(row: &Row) -> rusqlite::Result<TokenCredential> {
    Ok(TokenCredential {
        access_token: row.get(0)?,
        refresh_token: row.get(1)?,
        token_type: row.get(2)?,
        scope: row.get(3)?,
        expires_at: row.get(4)?,
        hardware_id: row.get(5)?,
    })
}
