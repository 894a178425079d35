//! # RingRelay Domain
//!
//! Business domain types and models for RingRelay.
//!
//! This crate contains:
//! - Credential and token types (password grant, refresh grant, 2FA hints)
//! - Event records and the inbound delivery envelope
//! - Ring resource types (locations, base stations, alarm modes)
//! - Domain error types and Result definitions
//! - Configuration structures
//!
//! ## Architecture
//! - No dependencies on other RingRelay crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
