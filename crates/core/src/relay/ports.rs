//! Port interface for the Ring REST API

use async_trait::async_trait;
use ringrelay_domain::{AlarmMode, BaseStation, Location, Result, TokenCredential};

/// Thin read/write calls against the Ring API, authorised with `token`.
#[async_trait]
pub trait RingApi: Send + Sync {
    /// Locations owned by the account.
    async fn locations(&self, token: &TokenCredential) -> Result<Vec<Location>>;

    /// Alarm base stations across all locations.
    async fn base_stations(&self, token: &TokenCredential) -> Result<Vec<BaseStation>>;

    /// Current alarm mode of `location_id`, as reported by Ring.
    async fn location_mode(&self, token: &TokenCredential, location_id: &str) -> Result<String>;

    /// Switch `location_id` to `mode`, returning the mode Ring reports back.
    async fn set_location_mode(
        &self,
        token: &TokenCredential,
        location_id: &str,
        mode: AlarmMode,
    ) -> Result<String>;
}
