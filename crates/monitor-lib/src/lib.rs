//! Monitor library for cluster saturation tracking
//!
//! This crate provides the core functionality for:
//! - Snapshot collection from the cluster control plane
//! - Derivation of typed monitoring events
//! - Append-only NDJSON/CSV event logs
//! - The tick-driven run loop and terminal run summary
//! - Prometheus metrics

pub mod collector;
pub mod engine;
pub mod error;
pub mod models;
pub mod observability;
pub mod runner;
pub mod sink;
pub mod units;

pub use error::MonitorError;
pub use models::*;
pub use observability::MonitorMetrics;
pub use runner::{Monitor, MonitorConfig};
