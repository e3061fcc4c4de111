#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod classification;
mod env;
mod loader;
pub mod server;
pub mod telemetry;

use serde::Deserialize;

pub use classification::*;
pub use server::*;
pub use telemetry::*;

/// Top-level faultline configuration
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP listener and health route
    #[serde(default)]
    pub server: ServerConfig,
    /// Failure classification overrides
    #[serde(default)]
    pub classification: ClassificationConfig,
    /// Log filter and output format
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
