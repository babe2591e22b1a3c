//! Engine Configuration
//!
//! Every field has a default, so `{}` is a complete configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::costing::CostingConstants;
use crate::geometry::SealAllowances;
use crate::materials::{MaterialRateTable, RateFile, RateSource, RateSourceError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// JSON rate table layered over the factory rates
    #[serde(default)]
    pub rates_path: Option<PathBuf>,
    #[serde(default)]
    pub seal_allowances: SealAllowances,
    #[serde(default)]
    pub costing: CostingConstants,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rates_path: None,
            seal_allowances: SealAllowances::default(),
            costing: CostingConstants::default(),
        }
    }
}

/// Where rates come from once the configuration is applied
pub enum ConfiguredRates {
    Factory(MaterialRateTable),
    File(RateFile),
}

impl RateSource for ConfiguredRates {
    fn snapshot(&self) -> Result<MaterialRateTable, RateSourceError> {
        match self {
            ConfiguredRates::Factory(table) => table.snapshot(),
            ConfiguredRates::File(file) => file.snapshot(),
        }
    }
}

impl EngineConfig {
    /// Load config from file; a missing file means defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: EngineConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        // Relative rate paths are relative to the config file
        if let (Some(rates), Some(dir)) = (config.rates_path.as_ref(), path.parent()) {
            if rates.is_relative() {
                config.rates_path = Some(dir.join(rates));
            }
        }

        Ok(config)
    }

    /// Rate source for this configuration; `override_path` beats `rates_path`
    pub fn rate_source(&self, override_path: Option<&Path>) -> ConfiguredRates {
        match override_path.or(self.rates_path.as_deref()) {
            Some(path) => ConfiguredRates::File(RateFile::new(path)),
            None => ConfiguredRates::Factory(MaterialRateTable::default()),
        }
    }
}
