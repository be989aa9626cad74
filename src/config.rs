use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

use crate::locations::LocationEntry;
use crate::merge::MergeStrategy;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RatesProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    /// Live exchange-rate endpoint. When absent the static default table
    /// is used.
    pub rates: Option<RatesProviderConfig>,
}

fn default_currency() -> String {
    "CNY".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// YAML file holding the standards catalog.
    pub standards_file: PathBuf,
    /// Known locations for identity-based city/country matching.
    #[serde(default)]
    pub locations: Vec<LocationEntry>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Default display currency for match reports.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Default merge strategy when the caller does not pick one.
    #[serde(default)]
    pub strategy: MergeStrategy,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "tsmatch", "tsmatch")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locations::LocationKind;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
standards_file: "standards.yaml"
locations:
  - id: "loc-sh"
    kind: city
    name: "Shanghai"
    aliases: ["Shanghai City"]
  - id: "loc-cn"
    kind: country
    name: "China"
currency: "USD"
strategy: "PRIORITY"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.standards_file, PathBuf::from("standards.yaml"));
        assert_eq!(config.locations.len(), 2);
        assert_eq!(config.locations[0].kind, LocationKind::City);
        assert_eq!(config.locations[0].aliases, vec!["Shanghai City"]);
        assert_eq!(config.currency, "USD");
        assert_eq!(config.strategy, MergeStrategy::Priority);
        assert!(config.providers.rates.is_none());
    }

    #[test]
    fn test_config_defaults() {
        let yaml_str = r#"
standards_file: "standards.yaml"
providers:
  rates:
    base_url: "http://example.com/fx"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).unwrap();
        assert_eq!(config.currency, "CNY");
        assert_eq!(config.strategy, MergeStrategy::MergeBest);
        assert!(config.locations.is_empty());
        assert_eq!(
            config.providers.rates.unwrap().base_url,
            "http://example.com/fx"
        );
    }
}
