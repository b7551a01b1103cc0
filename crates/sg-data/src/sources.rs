use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::providers::{JsonFileProvider, RiskDataProvider, SampleUniverseProvider};

/// Data source configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceConfig {
    pub name: String,
    pub source_type: DataSourceType,
    pub enabled: bool,
}

/// Types of risk data sources supported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataSourceType {
    Sample,
    JsonDirectory {
        path: PathBuf,
        #[serde(default)]
        pattern: Option<String>,
    },
}

impl DataSourceConfig {
    pub fn sample() -> Self {
        Self {
            name: "sample".to_string(),
            source_type: DataSourceType::Sample,
            enabled: true,
        }
    }

    pub fn json_directory(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            source_type: DataSourceType::JsonDirectory {
                path: PathBuf::from(path),
                pattern: None,
            },
            enabled: true,
        }
    }

    /// Instantiate the provider described by this config.
    pub fn build(&self) -> Box<dyn RiskDataProvider> {
        match &self.source_type {
            DataSourceType::Sample => Box::new(SampleUniverseProvider::new()),
            DataSourceType::JsonDirectory { path, pattern } => {
                let provider = JsonFileProvider::new(path);
                match pattern {
                    Some(pattern) => Box::new(provider.with_pattern(pattern)),
                    None => Box::new(provider),
                }
            }
        }
    }
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self::sample()
    }
}
