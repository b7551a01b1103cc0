use serde::{Deserialize, Serialize};
use sg_data::DataSourceConfig;
use sg_llm::BackendConfig;
use sg_types::{config_error, SgResult};
use std::path::{Path, PathBuf};

use crate::prompt::RequestedScenarioType;
use crate::summarizer::SummaryLimits;
use crate::validation::ValidationConfig;

/// Request defaults applied when a caller leaves a field out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationDefaults {
    pub num_scenarios: usize,
    pub scenario_type: RequestedScenarioType,
    /// Requested counts are clamped to `1..=max_scenarios`
    pub max_scenarios: usize,
    pub profile: String,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            num_scenarios: 3,
            scenario_type: RequestedScenarioType::Stress,
            max_scenarios: 10,
            profile: crate::profiles::DEFAULT_PROFILE.to_string(),
        }
    }
}

impl GenerationDefaults {
    pub fn clamp_count(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.num_scenarios)
            .clamp(1, self.max_scenarios.max(1))
    }
}

/// Scenario service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub listen_addr: String,
    /// Directory of `{selector}.json` universes, in addition to the sample
    pub data_dir: Option<PathBuf>,
    /// Contracts kept per loaded universe
    pub contract_limit: Option<usize>,
    pub cache_entries: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8090".to_string(),
            data_dir: None,
            contract_limit: None,
            cache_entries: 64,
        }
    }
}

impl ServiceConfig {
    /// Data sources in lookup order: the directory first, then the sample.
    pub fn data_sources(&self) -> Vec<DataSourceConfig> {
        let mut sources = Vec::new();
        if let Some(dir) = &self.data_dir {
            sources.push(DataSourceConfig::json_directory("data_dir", &dir.to_string_lossy()));
        }
        sources.push(DataSourceConfig::sample());
        sources
    }
}

/// Complete configuration for generation and the service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenGenConfig {
    pub backend: BackendConfig,
    pub generation: GenerationDefaults,
    pub summary: SummaryLimits,
    pub validation: ValidationConfig,
    pub service: ServiceConfig,
}

impl ScenGenConfig {
    /// Read from the file named by `SCENGEN_CONFIG` (if set), then apply
    /// environment overrides.
    pub fn load() -> SgResult<Self> {
        let mut config = match std::env::var("SCENGEN_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> SgResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| config_error!("cannot read config file {}: {}", path.display(), e))?;
        Self::from_json(&text).map_err(|e| config_error!("{}: {}", path.display(), e))
    }

    pub fn from_json(text: &str) -> SgResult<Self> {
        serde_json::from_str(text).map_err(|e| config_error!("invalid configuration: {}", e))
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> SgResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.backend.apply_overrides(&lookup)?;
        if let Some(addr) = lookup("SCENGEN_SERVICE_ADDR") {
            self.service.listen_addr = addr;
        }
        if let Some(dir) = lookup("SCENGEN_DATA_DIR") {
            self.service.data_dir = if dir.is_empty() { None } else { Some(PathBuf::from(dir)) };
        }
        Ok(())
    }

    pub fn validate(&self) -> SgResult<()> {
        self.backend.validate()?;
        if self.generation.max_scenarios == 0 {
            return Err(config_error!("generation.max_scenarios must be positive"));
        }
        if self.generation.num_scenarios == 0 || self.generation.num_scenarios > self.generation.max_scenarios {
            return Err(config_error!(
                "generation.num_scenarios must be within 1..={}",
                self.generation.max_scenarios
            ));
        }
        if self.service.cache_entries == 0 {
            return Err(config_error!("service.cache_entries must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationMode;
    use sg_llm::BackendProtocol;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ScenGenConfig::default();
        assert_eq!(config.generation.num_scenarios, 3);
        assert_eq!(config.generation.max_scenarios, 10);
        assert_eq!(config.summary.max_counterparties, 10);
        assert_eq!(config.validation.mode, ValidationMode::Advisory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"backend": {{"protocol": "canned"}}, "validation": {{"mode": "strict"}}, "generation": {{"max_scenarios": 5}}}}"#
        )
        .unwrap();

        let config = ScenGenConfig::from_file(file.path()).unwrap();
        assert_eq!(config.backend.protocol, BackendProtocol::Canned);
        assert_eq!(config.backend.timeout_secs, 300);
        assert_eq!(config.validation.mode, ValidationMode::Strict);
        assert_eq!(config.validation.max_fx_shock, 0.3);
        assert_eq!(config.generation.max_scenarios, 5);
        assert_eq!(config.generation.num_scenarios, 3);
    }

    #[test]
    fn test_bad_file_is_config_error() {
        assert!(ScenGenConfig::from_file("/nonexistent/scengen.json").unwrap_err().is_config());
        assert!(ScenGenConfig::from_json("{\"generation\": 3}").unwrap_err().is_config());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("LLM_PROTOCOL", "canned"),
            ("SCENGEN_SERVICE_ADDR", "127.0.0.1:9000"),
            ("SCENGEN_DATA_DIR", "/srv/universes"),
        ]
        .into_iter()
        .collect();

        let mut config = ScenGenConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.backend.protocol, BackendProtocol::Canned);
        assert_eq!(config.service.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.service.data_sources().len(), 2);
    }

    #[test]
    fn test_clamp_count() {
        let defaults = GenerationDefaults::default();
        assert_eq!(defaults.clamp_count(None), 3);
        assert_eq!(defaults.clamp_count(Some(0)), 1);
        assert_eq!(defaults.clamp_count(Some(50)), 10);
    }

    #[test]
    fn test_validate_rejects_inconsistent_counts() {
        let mut config = ScenGenConfig::default();
        config.generation.num_scenarios = 20;
        assert!(config.validate().unwrap_err().is_config());
    }
}
