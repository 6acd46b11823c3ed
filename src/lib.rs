//! EnvNode firmware library.
//!
//! Exposes the pure-logic modules for integration testing and host
//! builds.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod actuation;
pub mod app;
pub mod config;
pub mod error;
pub mod pins;
pub mod protocol;
pub mod scheduler;
pub mod sensors;
pub mod telemetry;

// Host builds get stub implementations behind the same API.
pub mod adapters;
pub mod drivers;
