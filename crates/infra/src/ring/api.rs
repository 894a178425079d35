//! Ring REST API client

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Method;
use ringrelay_core::RingApi;
use ringrelay_domain::constants::HEADER_HARDWARE_ID;
use ringrelay_domain::{
    AlarmMode, BaseStation, DevicesResponse, Location, LocationModeResponse, LocationsResponse,
    Result, RingConfig, TokenCredential,
};
use serde_json::json;

use crate::http::HttpClient;

/// Bearer-authorised calls against `app.ring.com` and `api.ring.com`.
#[derive(Clone)]
pub struct RingApiClient {
    http: HttpClient,
    app_base_url: String,
    client_api_base_url: String,
}

impl RingApiClient {
    pub fn new(
        http: HttpClient,
        app_base_url: impl Into<String>,
        client_api_base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            app_base_url: app_base_url.into().trim_end_matches('/').to_string(),
            client_api_base_url: client_api_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(http: HttpClient, config: &RingConfig) -> Self {
        Self::new(http, config.app_base_url.clone(), config.client_api_base_url.clone())
    }

    fn mode_url(&self, location_id: &str) -> String {
        format!("{}/api/v1/mode/location/{}", self.app_base_url, location_id)
    }
}

fn auth_headers(token: &TokenCredential) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert("authorization".to_string(), format!("Bearer {}", token.access_token));
    headers.insert(HEADER_HARDWARE_ID.to_string(), token.hardware_id.clone());
    headers
}

#[async_trait]
impl RingApi for RingApiClient {
    async fn locations(&self, token: &TokenCredential) -> Result<Vec<Location>> {
        let url = format!("{}/rhq/v1/devices/v1/locations", self.app_base_url);
        let response: LocationsResponse =
            self.http.call_json::<(), _>(Method::GET, &url, None, &auth_headers(token)).await?;
        Ok(response.user_locations)
    }

    async fn base_stations(&self, token: &TokenCredential) -> Result<Vec<BaseStation>> {
        let url = format!("{}/ring_devices", self.client_api_base_url);
        let response: DevicesResponse =
            self.http.call_json::<(), _>(Method::GET, &url, None, &auth_headers(token)).await?;
        Ok(response.base_stations)
    }

    async fn location_mode(&self, token: &TokenCredential, location_id: &str) -> Result<String> {
        let response: LocationModeResponse = self
            .http
            .call_json::<(), _>(Method::GET, &self.mode_url(location_id), None, &auth_headers(token))
            .await?;
        Ok(response.mode)
    }

    async fn set_location_mode(
        &self,
        token: &TokenCredential,
        location_id: &str,
        mode: AlarmMode,
    ) -> Result<String> {
        let body = json!({ "mode": mode });
        let response: LocationModeResponse = self
            .http
            .call_json(Method::POST, &self.mode_url(location_id), Some(&body), &auth_headers(token))
            .await?;
        Ok(response.mode)
    }
}
