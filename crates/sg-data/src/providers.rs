use async_trait::async_trait;
use sg_types::{DataError, RiskUniverse, SgResult};
use std::path::{Path, PathBuf};

use crate::sample::sample_universe;

/// Selector name used when a request does not name a universe.
pub const DEFAULT_SELECTOR: &str = "default";

/// Source of risk universes (files, databases, demo fixtures, ...)
#[async_trait]
pub trait RiskDataProvider: Send + Sync + std::fmt::Debug {
    /// Check if this provider can serve the given selector
    fn supports_selector(&self, selector: Option<&str>) -> bool;

    /// Load the universe for `selector`, keeping at most `limit` contracts
    async fn load(&self, selector: Option<&str>, limit: Option<usize>) -> SgResult<RiskUniverse>;

    /// Get provider name
    fn name(&self) -> &str;

    /// Get provider configuration
    fn config(&self) -> serde_json::Value;
}

fn apply_limit(mut universe: RiskUniverse, limit: Option<usize>) -> RiskUniverse {
    if let Some(limit) = limit {
        universe.truncate_contracts(limit);
    }
    universe
}

/// Built-in demo universe, served for no selector or the `sample` selector
#[derive(Debug)]
pub struct SampleUniverseProvider {
    pub name: String,
}

impl SampleUniverseProvider {
    pub fn new() -> Self {
        Self {
            name: "Sample Universe Provider".to_string(),
        }
    }
}

impl Default for SampleUniverseProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RiskDataProvider for SampleUniverseProvider {
    fn supports_selector(&self, selector: Option<&str>) -> bool {
        matches!(selector, None | Some("sample"))
    }

    async fn load(&self, selector: Option<&str>, limit: Option<usize>) -> SgResult<RiskUniverse> {
        if !self.supports_selector(selector) {
            return Err(DataError::unavailable(selector).into());
        }
        Ok(apply_limit(sample_universe()?, limit))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "sample",
            "selectors": [null, "sample"]
        })
    }
}

/// Reads serialized universes from `{selector}.json` files in a directory
#[derive(Debug)]
pub struct JsonFileProvider {
    pub name: String,
    pub data_directory: PathBuf,
    pub file_pattern: String,
}

impl JsonFileProvider {
    pub fn new<P: AsRef<Path>>(data_directory: P) -> Self {
        Self {
            name: "JSON File Provider".to_string(),
            data_directory: data_directory.as_ref().to_path_buf(),
            file_pattern: "{selector}.json".to_string(),
        }
    }

    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.file_pattern = pattern.to_string();
        self
    }

    fn get_file_path(&self, selector: Option<&str>) -> PathBuf {
        let filename = self
            .file_pattern
            .replace("{selector}", selector.unwrap_or(DEFAULT_SELECTOR));
        self.data_directory.join(filename)
    }
}

#[async_trait]
impl RiskDataProvider for JsonFileProvider {
    fn supports_selector(&self, selector: Option<&str>) -> bool {
        // Selectors become file names; reject anything that could escape the directory.
        if let Some(name) = selector {
            if name.is_empty() || name.contains(|c: char| c == '/' || c == '\\') || name.contains("..") {
                return false;
            }
        }
        self.get_file_path(selector).exists()
    }

    async fn load(&self, selector: Option<&str>, limit: Option<usize>) -> SgResult<RiskUniverse> {
        if !self.supports_selector(selector) {
            tracing::debug!(
                path = %self.get_file_path(selector).display(),
                "no universe file for selector"
            );
            return Err(DataError::unavailable(selector).into());
        }

        let file_path = self.get_file_path(selector);
        tracing::info!("Loading risk universe from: {}", file_path.display());

        let text = tokio::fs::read_to_string(&file_path).await?;
        let universe: RiskUniverse = serde_json::from_str(&text).map_err(|e| DataError::InvalidFormat {
            message: format!("{}: {}", file_path.display(), e),
        })?;
        universe.validate()?;

        let universe = apply_limit(universe, limit);
        tracing::info!(
            factors = universe.risk_factors.len(),
            counterparties = universe.counterparties.len(),
            contracts = universe.contracts.len(),
            "Loaded risk universe from {}",
            file_path.display()
        );
        Ok(universe)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "json_file",
            "directory": self.data_directory,
            "pattern": self.file_pattern
        })
    }
}
