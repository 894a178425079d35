//! OAuth token endpoint client

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Method;
use ringrelay_core::TokenGrantClient;
use ringrelay_domain::{GrantPayload, Result, RingConfig, TokenResponse};
use tracing::debug;

use crate::http::HttpClient;

/// Posts grants to the Ring OAuth endpoint.
#[derive(Clone)]
pub struct RingOAuthClient {
    http: HttpClient,
    token_url: String,
}

impl RingOAuthClient {
    pub fn new(http: HttpClient, token_url: impl Into<String>) -> Self {
        Self { http, token_url: token_url.into() }
    }

    pub fn from_config(http: HttpClient, config: &RingConfig) -> Self {
        Self::new(http, config.oauth_url.clone())
    }
}

#[async_trait]
impl TokenGrantClient for RingOAuthClient {
    async fn request_token(
        &self,
        payload: &GrantPayload,
        headers: &BTreeMap<String, String>,
    ) -> Result<TokenResponse> {
        debug!(
            grant_type = %payload.grant.mode(),
            with_code = headers.contains_key(ringrelay_domain::constants::HEADER_2FA_CODE),
            "posting token grant"
        );
        self.http.call_json(Method::POST, &self.token_url, Some(payload), headers).await
    }
}
