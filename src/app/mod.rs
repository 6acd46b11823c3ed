//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the orchestration rules for the EnvNode: the
//! cooperative loop, link-health probing, and the events it reports.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod events;
pub mod health;
pub mod ports;
pub mod service;
