pub mod providers;
pub mod cache;
pub mod sources;
pub mod sample;

pub use providers::*;
pub use cache::*;
pub use sources::*;
pub use sample::*;

use sg_types::{DataError, RiskUniverse, SgResult};
use std::sync::Arc;

/// Data manager coordinates the universe cache and the registered providers
#[derive(Debug)]
pub struct DataManager {
    pub cache: UniverseCache,
    pub providers: Vec<Box<dyn RiskDataProvider>>,
    /// Contract cap applied when loading from a provider.
    pub contract_limit: Option<usize>,
}

impl DataManager {
    pub fn new() -> Self {
        Self {
            cache: UniverseCache::new(),
            providers: Vec::new(),
            contract_limit: None,
        }
    }

    pub fn with_sources(sources: &[DataSourceConfig]) -> Self {
        let mut manager = Self::new();
        for source in sources.iter().filter(|s| s.enabled) {
            manager.add_provider(source.build());
        }
        manager
    }

    pub fn with_contract_limit(mut self, limit: usize) -> Self {
        self.contract_limit = Some(limit);
        self
    }

    pub fn add_provider(&mut self, provider: Box<dyn RiskDataProvider>) {
        self.providers.push(provider);
    }

    /// Cached universe for `selector`, loading it from the first provider that
    /// supports the selector on a miss.
    pub async fn load_universe(&self, selector: Option<&str>) -> SgResult<Arc<RiskUniverse>> {
        if let Some(universe) = self.cache.lookup(selector) {
            return Ok(universe);
        }

        for provider in &self.providers {
            if provider.supports_selector(selector) {
                let universe = provider.load(selector, self.contract_limit).await?;
                tracing::info!(
                    provider = provider.name(),
                    selector = ?selector,
                    contracts = universe.contracts.len(),
                    "risk universe loaded"
                );
                return Ok(self.cache.store(selector, universe));
            }
        }

        Err(DataError::unavailable(selector).into())
    }

    /// Strict cache read: never loads.
    pub fn cached_universe(&self, selector: Option<&str>) -> SgResult<Arc<RiskUniverse>> {
        self.cache.get(selector)
    }
}

impl Default for DataManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_through_cache() {
        let mut manager = DataManager::new().with_contract_limit(3);
        manager.add_provider(Box::new(SampleUniverseProvider::new()));

        assert!(manager.cached_universe(None).unwrap_err().is_data_unavailable());

        let first = manager.load_universe(None).await.unwrap();
        assert_eq!(first.contracts.len(), 3);

        let second = manager.load_universe(None).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.cache.get_stats().stores, 1);
    }

    #[tokio::test]
    async fn test_unknown_selector_is_unavailable() {
        let manager = DataManager::with_sources(&[DataSourceConfig::sample()]);
        let err = manager.load_universe(Some("BOOK_Z")).await.unwrap_err();
        assert!(err.is_data_unavailable());
    }
}
