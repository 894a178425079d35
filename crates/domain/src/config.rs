//! Configuration structures
//!
//! Every field has a serde default so partial TOML/JSON files are accepted.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DB_PATH, DEFAULT_DB_POOL_SIZE, DEFAULT_MAX_ATTEMPTS, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_RETRY_DELAY_MS, REFRESH_BUFFER_SECS, RING_APP_BASE_URL, RING_CLIENT_API_BASE_URL,
    RING_CLIENT_ID, RING_OAUTH_URL, RING_SCOPE, RING_USER_AGENT,
};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ring: RingConfig,
    #[serde(default)]
    pub relay: RelayOptions,
}

/// SQLite store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path(), pool_size: default_pool_size() }
    }
}

/// Ring endpoints, client identity and HTTP retry budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingConfig {
    #[serde(default = "default_oauth_url")]
    pub oauth_url: String,
    /// Host for location and mode endpoints
    #[serde(default = "default_app_base_url")]
    pub app_base_url: String,
    /// Host for the `ring_devices` endpoint
    #[serde(default = "default_client_api_base_url")]
    pub client_api_base_url: String,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            oauth_url: default_oauth_url(),
            app_base_url: default_app_base_url(),
            client_api_base_url: default_client_api_base_url(),
            client_id: default_client_id(),
            scope: default_scope(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// What the handler does when `acknowledge` is rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Treat the event as handled elsewhere and finish successfully.
    #[default]
    Skip,
    /// Surface the conflict so the delivery mechanism redelivers.
    Fail,
}

/// Handler behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayOptions {
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
    #[serde(default = "default_refresh_buffer_secs")]
    pub refresh_buffer_secs: i64,
    /// Run acknowledge/complete around processing. Disabled only for local
    /// dry runs against a real account.
    #[serde(default = "default_true")]
    pub guard_events: bool,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            conflict_policy: ConflictPolicy::default(),
            refresh_buffer_secs: default_refresh_buffer_secs(),
            guard_events: true,
        }
    }
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

const fn default_pool_size() -> u32 {
    DEFAULT_DB_POOL_SIZE
}

fn default_oauth_url() -> String {
    RING_OAUTH_URL.to_string()
}

fn default_app_base_url() -> String {
    RING_APP_BASE_URL.to_string()
}

fn default_client_api_base_url() -> String {
    RING_CLIENT_API_BASE_URL.to_string()
}

fn default_client_id() -> String {
    RING_CLIENT_ID.to_string()
}

fn default_scope() -> String {
    RING_SCOPE.to_string()
}

fn default_user_agent() -> String {
    RING_USER_AGENT.to_string()
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

const fn default_max_attempts() -> usize {
    DEFAULT_MAX_ATTEMPTS
}

const fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}

const fn default_refresh_buffer_secs() -> i64 {
    REFRESH_BUFFER_SECS
}

const fn default_true() -> bool {
    true
}
