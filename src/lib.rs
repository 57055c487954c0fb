//! Switchboard - health-aware routing core for model inference gateways
//!
//! Picks a backend for each `(organization, model)` request from weighted
//! routing policies, skips degraded backends using background health checks,
//! and fails over across the remaining backends until one answers.
//!
//! [`gateway::Gateway`] wires the pieces together from a
//! [`config::SwitchboardConfig`].

pub mod cli;
pub mod client;
pub mod config;
pub mod gateway;
pub mod health;
pub mod logging;
pub mod model_registry;
pub mod policy;
pub mod registry;
pub mod routing;
pub mod telemetry;

pub use gateway::Gateway;
