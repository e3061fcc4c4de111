//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use faultline_config::{Config, HealthConfig, RpcCodeSetting, ServerConfig, StatusOverride};

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    health: HealthConfig::default(),
                },
                ..Config::default()
            },
        }
    }

    /// Register a status for a failure type
    pub fn with_override(mut self, failure_type: &str, http_status: u16, rpc_code: i32, description: &str) -> Self {
        self.config.classification.overrides.push(StatusOverride {
            failure_type: failure_type.to_owned(),
            http_status,
            rpc_code: RpcCodeSetting::new(rpc_code),
            description: description.to_owned(),
        });
        self
    }

    pub fn with_health_path(mut self, path: &str) -> Self {
        self.config.server.health.path = path.to_owned();
        self
    }

    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
