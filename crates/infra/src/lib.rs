//! # RingRelay Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The retrying HTTP caller (reqwest)
//! - Ring OAuth and REST API clients
//! - SQLite credential and event stores (rusqlite + r2d2)
//! - Configuration loading, console 2FA prompt, tracing setup
//!
//! ## Architecture
//! - Implements traits defined in `ringrelay-core`
//! - Contains all "impure" code (I/O)

pub mod config;
pub mod console;
pub mod database;
pub mod errors;
pub mod http;
pub mod observability;
pub mod ring;


// Re-export commonly used items
pub use console::ConsoleChallengeResolver;
pub use database::{DbManager, SqliteCredentialStore, SqliteEventStore};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use observability::{init_tracing, LogFormat};
pub use ring::{RingApiClient, RingOAuthClient};
