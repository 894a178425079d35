//! Application context - dependency injection container

use std::sync::Arc;

use ringrelay_core::{
    Credential, CredentialManager, CredentialStore, EventStore, RelayHandler, RelayPorts, RingApi,
    TokenGrantClient, TokenSink,
};
use ringrelay_domain::{Principal, RelayConfig, Result};
use ringrelay_infra::{
    DbManager, HttpClient, RingApiClient, RingOAuthClient, SqliteCredentialStore, SqliteEventStore,
};
use tracing::{debug, info};

/// Application context - holds all stores and clients
pub struct AppContext {
    pub config: RelayConfig,
    pub db: Arc<DbManager>,
    pub credentials: Arc<SqliteCredentialStore>,
    pub events: Arc<SqliteEventStore>,
    pub grant_client: Arc<RingOAuthClient>,
    pub ring: Arc<RingApiClient>,
}

impl AppContext {
    /// Open the database, apply the schema and build the Ring clients.
    ///
    /// # Errors
    /// `StoreUnavailable` when the database cannot be opened or migrated,
    /// `Client` when the HTTP client cannot be built.
    pub fn new(config: RelayConfig) -> Result<Self> {
        let db = Arc::new(DbManager::from_config(&config.database)?);
        db.run_migrations()?;

        let http = HttpClient::from_config(&config.ring)?;
        let grant_client = Arc::new(RingOAuthClient::from_config(http.clone(), &config.ring));
        let ring = Arc::new(RingApiClient::from_config(http, &config.ring));

        info!(
            db_path = %db.path().display(),
            conflict_policy = ?config.relay.conflict_policy,
            guard_events = config.relay.guard_events,
            "application context ready"
        );

        Ok(Self {
            credentials: Arc::new(SqliteCredentialStore::new(Arc::clone(&db))),
            events: Arc::new(SqliteEventStore::new(Arc::clone(&db))),
            config,
            db,
            grant_client,
            ring,
        })
    }

    /// Handler wired against the SQLite stores and the Ring clients.
    pub fn relay_handler(&self) -> RelayHandler {
        let credentials: Arc<dyn CredentialStore> = self.credentials.clone();
        let sink: Arc<dyn TokenSink> = self.credentials.clone();
        let events: Arc<dyn EventStore> = self.events.clone();
        let grant_client: Arc<dyn TokenGrantClient> = self.grant_client.clone();
        let ring: Arc<dyn RingApi> = self.ring.clone();

        RelayHandler::new(
            RelayPorts { events, credentials, sink, grant_client, ring },
            self.config.relay.clone(),
        )
        .with_client_identity(self.config.ring.client_id.clone(), self.config.ring.scope.clone())
    }

    /// Credential manager that persists every new token to the credential store.
    pub fn credential_manager(
        &self,
        principal: Principal,
        credential: Credential,
    ) -> CredentialManager {
        debug!(%principal, "building credential manager");
        CredentialManager::new(
            principal,
            credential,
            self.grant_client.clone(),
            self.credentials.clone(),
        )
        .with_client_identity(self.config.ring.client_id.clone(), self.config.ring.scope.clone())
        .with_refresh_buffer(self.config.relay.refresh_buffer_secs)
    }
}
