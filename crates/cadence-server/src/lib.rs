//! Cadence Server Library
//!
//! HTTP boundary, configuration and logging for the Cadence SM-2 scheduler.
//! Shared by the `cadence-server` and `cadence` binaries.

pub mod api;
pub mod config;
pub mod logging;
