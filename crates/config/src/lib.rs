//! Configuration loading for the labs client.
//!
//! Uses figment to layer, in order: built-in defaults, an optional YAML file,
//! and `LABS_`-prefixed environment variables (`__` separates nested keys,
//! e.g. `LABS_LABS__POLL_INTERVAL_MS=500`).

pub mod schema;

pub use schema::{AuthConfig, Config, LabsConfig, LogConfig};
