//! Application constants
//!
//! Centralized location for the Ring endpoints, OAuth client identity and the
//! timing defaults used by the credential manager and HTTP caller.

// Ring OAuth endpoint and client identity
pub const RING_OAUTH_URL: &str = "https://oauth.ring.com/oauth/token";
pub const RING_CLIENT_ID: &str = "ring_official_android";
pub const RING_SCOPE: &str = "client";
pub const RING_USER_AGENT: &str = "android:com.ringapp";

// Ring REST API hosts
pub const RING_APP_BASE_URL: &str = "https://app.ring.com";
pub const RING_CLIENT_API_BASE_URL: &str = "https://api.ring.com/clients_api";

// OAuth request headers
pub const HEADER_HARDWARE_ID: &str = "hardware_id";
pub const HEADER_2FA_SUPPORT: &str = "2fa-support";
pub const HEADER_2FA_CODE: &str = "2fa-code";

// Token refresh window: refresh when fewer than this many seconds remain
pub const REFRESH_BUFFER_SECS: i64 = 600;

// HTTP caller defaults
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

// SQLite defaults
pub const DEFAULT_DB_PATH: &str = "ringrelay.db";
pub const DEFAULT_DB_POOL_SIZE: u32 = 4;
