//! Components of the dispatch simulator.
//!
//! ## Submodules
//!
//! - [`config`] - CLI and environment configuration, validated into a
//!   [`config::SimConfig`].
//! - [`endpoint`] - Simulated dry-run endpoints with jittered latency and
//!   random failures.
//! - [`runner`] - Submits requests through the dispatch queue and collects
//!   their outcomes.
//! - [`report`] - Aggregates outcomes into the printed summary.
//! - [`telemetry`] - Console logging and optional OpenTelemetry export.

pub mod config;
pub mod endpoint;
pub mod report;
pub mod runner;
pub mod telemetry;
