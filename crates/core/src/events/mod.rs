//! Event record ownership

pub mod guard;
pub mod ports;

pub use guard::EventStateGuard;
