use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        raw.parse()
    }

    /// Check every classification override
    pub fn validate(&self) -> anyhow::Result<()> {
        for (index, entry) in self.classification.overrides.iter().enumerate() {
            if entry.failure_type.trim().is_empty() {
                anyhow::bail!("classification override #{index} has a blank failure_type");
            }

            let name = &entry.failure_type;

            if !(100..=599).contains(&entry.http_status) {
                anyhow::bail!(
                    "classification override '{name}' has invalid http_status {}, expected 100..=599",
                    entry.http_status
                );
            }

            if !entry.rpc_code.is_valid() {
                anyhow::bail!(
                    "classification override '{name}' has invalid rpc_code {}, expected 0..=16",
                    entry.rpc_code.value()
                );
            }

            if entry.description.trim().is_empty() {
                anyhow::bail!("classification override '{name}' has a blank description");
            }
        }

        Ok(())
    }
}

impl std::str::FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }
}
