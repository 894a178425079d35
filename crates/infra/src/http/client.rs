use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, StatusCode};
use ringrelay_domain::constants::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RETRY_DELAY_MS,
};
use ringrelay_domain::{ChallengeHint, RelayError, RingConfig};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::InfraError;

/// Longest response body excerpt carried in a client error.
const ERROR_BODY_LIMIT: usize = 256;

/// HTTP client with built-in retry and timeout support.
///
/// - 2xx is returned as is
/// - 412 fails at once with [`RelayError::ChallengeRequired`]
/// - 5xx and transport failures are retried with a fixed delay, then surface
///   as [`RelayError::Transient`]
/// - any other status fails at once with [`RelayError::Client`]
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: usize,
    retry_delay: Duration,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, RelayError> {
        Self::builder().build()
    }

    /// Client configured from the `[ring]` config section.
    pub fn from_config(config: &RingConfig) -> Result<Self, RelayError> {
        Self::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .max_attempts(config.max_attempts)
            .retry_delay(Duration::from_millis(config.retry_delay_ms))
            .user_agent(config.user_agent.clone())
            .build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Send one logical request: `payload` as a JSON body when present,
    /// `headers` added verbatim.
    ///
    /// # Errors
    /// See the type-level documentation.
    pub async fn call<P>(
        &self,
        method: Method,
        url: &str,
        payload: Option<&P>,
        headers: &BTreeMap<String, String>,
    ) -> Result<Response, RelayError>
    where
        P: Serialize + ?Sized,
    {
        let mut builder = self.client.request(method, url);
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = payload {
            builder = builder.json(body);
        }
        self.send(builder).await
    }

    /// [`Self::call`], then decode the body as `T`.
    ///
    /// # Errors
    /// A body that does not decode into `T` is a [`RelayError::Client`].
    pub async fn call_json<P, T>(
        &self,
        method: Method,
        url: &str,
        payload: Option<&P>,
        headers: &BTreeMap<String, String>,
    ) -> Result<T, RelayError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.call(method, url, payload, headers).await?;
        decode_json(response).await
    }

    /// Execute the provided request builder with retry semantics.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, RelayError> {
        let attempts = self.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            let cloned_builder = builder.try_clone().ok_or_else(|| {
                RelayError::client(
                    "request body cannot be cloned; buffer the body to enable retries",
                )
            })?;

            let request = cloned_builder.build().map_err(|err| {
                let infra: InfraError = err.into();
                RelayError::from(infra)
            })?;

            let method = request.method().clone();
            let url = request.url().clone();
            debug!(attempt, %method, %url, "sending HTTP request");

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt, %method, %url, %status, "received HTTP response");

                    if status.is_success() {
                        return Ok(response);
                    }

                    if status == StatusCode::PRECONDITION_FAILED {
                        return Err(RelayError::ChallengeRequired(challenge_hint(response).await));
                    }

                    if status.is_server_error() {
                        last_error = Some(format!("HTTP {} from {}", status.as_u16(), url));
                        if attempt < attempts {
                            warn!(attempt, %method, %url, %status, "server error, retrying");
                            self.sleep_before_retry().await;
                        }
                        continue;
                    }

                    return Err(client_error(response).await);
                }
                Err(err) => {
                    debug!(attempt, %method, %url, error = %err, "HTTP request failed");

                    if !should_retry_error(&err) {
                        let infra: InfraError = err.into();
                        return Err(RelayError::from(infra));
                    }

                    last_error = Some(err.to_string());
                    if attempt < attempts {
                        warn!(attempt, %method, %url, error = %err, "transport failure, retrying");
                        self.sleep_before_retry().await;
                    }
                }
            }
        }

        let detail = last_error.unwrap_or_else(|| "no attempt was made".into());
        Err(RelayError::Transient(format!("{detail} (gave up after {attempts} attempts)")))
    }

    async fn sleep_before_retry(&self) {
        if !self.retry_delay.is_zero() {
            tokio::time::sleep(self.retry_delay).await;
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: usize,
    retry_delay: Duration,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            user_agent: None,
        }
    }
}

impl HttpClientBuilder {
    /// Per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Fixed pause between attempts.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<HttpClient, RelayError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(|err| {
            let infra: InfraError = err.into();
            RelayError::from(infra)
        })?;

        Ok(HttpClient { client, max_attempts: self.max_attempts.max(1), retry_delay: self.retry_delay })
    }
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_request() || err.is_connect()
}

/// Decode a successful response body into `T`.
pub(crate) async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, RelayError> {
    let status = response.status().as_u16();
    let bytes = response.bytes().await.map_err(|err| {
        let infra: InfraError = err.into();
        RelayError::from(infra)
    })?;

    serde_json::from_slice(&bytes).map_err(|err| RelayError::Client {
        status: Some(status),
        message: format!("malformed response body: {err}"),
    })
}

/// Read the 412 body; an unreadable body still yields a challenge.
async fn challenge_hint(response: Response) -> ChallengeHint {
    match response.json::<ChallengeHint>().await {
        Ok(hint) => hint,
        Err(err) => {
            warn!(error = %err, "challenge response body did not decode");
            ChallengeHint::default()
        }
    }
}

async fn client_error(response: Response) -> RelayError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let excerpt: String = body.chars().take(ERROR_BODY_LIMIT).collect();
    let reason = status.canonical_reason().unwrap_or("unknown status");

    RelayError::Client {
        status: Some(status.as_u16()),
        message: if excerpt.is_empty() {
            format!("HTTP {} {}", status.as_u16(), reason)
        } else {
            format!("HTTP {} {}: {}", status.as_u16(), reason, excerpt)
        },
    }
}
