//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. An explicit `--config` path always wins
//! 2. Otherwise, attempts to load from environment variables
//! 3. If `RINGRELAY_DB_PATH` is unset, falls back to a probed file
//! 4. If no file exists either, built-in defaults are used
//!
//! ## Environment Variables
//! - `RINGRELAY_DB_PATH`: Database file path (required for env loading)
//! - `RINGRELAY_DB_POOL_SIZE`: Connection pool size
//! - `RINGRELAY_OAUTH_URL`: OAuth token endpoint
//! - `RINGRELAY_APP_BASE_URL`: Host for location and mode endpoints
//! - `RINGRELAY_CLIENT_API_BASE_URL`: Host for the devices endpoint
//! - `RINGRELAY_HTTP_TIMEOUT_SECS`: Per-attempt timeout
//! - `RINGRELAY_HTTP_MAX_ATTEMPTS`: Attempts per request (initial + retries)
//! - `RINGRELAY_HTTP_RETRY_DELAY_MS`: Fixed delay between attempts
//! - `RINGRELAY_CONFLICT_POLICY`: `skip` or `fail`
//! - `RINGRELAY_REFRESH_BUFFER_SECS`: Refresh window before token expiry
//! - `RINGRELAY_GUARD_EVENTS`: Run acknowledge/complete (true/false)
//!
//! ## File Locations
//! The loader probes `ringrelay.{toml,json}` and `config.{toml,json}` in the
//! current directory, its parent, and next to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ringrelay_domain::{
    ConflictPolicy, DatabaseConfig, RelayConfig, RelayError, RelayOptions, Result, RingConfig,
};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["ringrelay.toml", "ringrelay.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `RelayError::Config` if an explicit or probed file cannot be read
/// or parsed, or an environment variable holds an invalid value.
pub fn load(path: Option<PathBuf>) -> Result<RelayConfig> {
    if let Some(path) = path {
        return load_from_file(Some(path));
    }

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            match probe_config_paths() {
                Some(path) => load_from_file(Some(path)),
                None => {
                    tracing::info!("No configuration found, using built-in defaults");
                    Ok(RelayConfig::default())
                }
            }
        }
    }
}

/// Load configuration from environment variables
///
/// `RINGRELAY_DB_PATH` must be present; every other variable falls back to
/// its default when unset.
///
/// # Errors
/// Returns `RelayError::Config` if `RINGRELAY_DB_PATH` is missing or any
/// variable has an invalid value.
pub fn load_from_env() -> Result<RelayConfig> {
    let defaults = RelayConfig::default();

    let database = DatabaseConfig {
        path: env_var("RINGRELAY_DB_PATH")?,
        pool_size: env_parse("RINGRELAY_DB_POOL_SIZE", defaults.database.pool_size)?,
    };

    let ring = RingConfig {
        oauth_url: env_or("RINGRELAY_OAUTH_URL", defaults.ring.oauth_url),
        app_base_url: env_or("RINGRELAY_APP_BASE_URL", defaults.ring.app_base_url),
        client_api_base_url: env_or(
            "RINGRELAY_CLIENT_API_BASE_URL",
            defaults.ring.client_api_base_url,
        ),
        request_timeout_secs: env_parse(
            "RINGRELAY_HTTP_TIMEOUT_SECS",
            defaults.ring.request_timeout_secs,
        )?,
        max_attempts: env_parse("RINGRELAY_HTTP_MAX_ATTEMPTS", defaults.ring.max_attempts)?,
        retry_delay_ms: env_parse("RINGRELAY_HTTP_RETRY_DELAY_MS", defaults.ring.retry_delay_ms)?,
        ..defaults.ring
    };

    let conflict_policy = match std::env::var("RINGRELAY_CONFLICT_POLICY") {
        Ok(value) => parse_conflict_policy(&value)?,
        Err(_) => defaults.relay.conflict_policy,
    };

    let relay = RelayOptions {
        conflict_policy,
        refresh_buffer_secs: env_parse(
            "RINGRELAY_REFRESH_BUFFER_SECS",
            defaults.relay.refresh_buffer_secs,
        )?,
        guard_events: env_bool("RINGRELAY_GUARD_EVENTS", defaults.relay.guard_events),
    };

    Ok(RelayConfig { database, ring, relay })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `RelayError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<RelayConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(RelayError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            RelayError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| RelayError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<RelayConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| RelayError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| RelayError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(RelayError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.clone());
        dirs.push(cwd.join(".."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        RelayError::Config(format!("Missing required environment variable: {}", key))
    })
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

/// Parse an optional environment variable, using `default` when unset.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| RelayError::Config(format!("Invalid value for {}: {}", key, e))),
        Err(_) => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

fn parse_conflict_policy(value: &str) -> Result<ConflictPolicy> {
    match value.trim().to_ascii_lowercase().as_str() {
        "skip" => Ok(ConflictPolicy::Skip),
        "fail" => Ok(ConflictPolicy::Fail),
        other => Err(RelayError::Config(format!(
            "Invalid conflict policy '{other}', expected 'skip' or 'fail'"
        ))),
    }
}
