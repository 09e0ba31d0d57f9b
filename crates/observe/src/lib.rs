//! This crate is intended to contain code that is required to provide or
//! improve the observability of the protocol binaries. For now that is the
//! logging initialization shared by the CLI and the tests.
pub mod config;
pub mod tracing;

pub use config::Config;
