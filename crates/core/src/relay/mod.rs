//! Per-event orchestration

pub mod handler;
pub mod ports;

pub use handler::{RelayHandler, RelayOutcome};
