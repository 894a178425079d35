//! # RingRelay App
//!
//! Command-line application layer.
//!
//! This crate contains:
//! - Application context (dependency injection)
//! - One module per CLI subcommand
//! - Main entry point and exit-code mapping
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod commands;
pub mod context;

// Re-export for convenience
pub use context::AppContext;
