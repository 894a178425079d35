//! Ring endpoints: OAuth token grants and the REST API

pub mod api;
pub mod oauth;

pub use api::RingApiClient;
pub use oauth::RingOAuthClient;
