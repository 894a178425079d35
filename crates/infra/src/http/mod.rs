//! HTTP transport with bounded retries

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
