use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::contract::Contract;
use crate::counterparty::Counterparty;
use crate::errors::{SgError, SgResult};
use crate::risk_factors::RiskFactor;

/// Immutable snapshot of the risk state used for one generation request.
///
/// `factor_id` is unique across `risk_factors`; [`RiskUniverse::new`] and
/// [`RiskUniverse::validate`] enforce it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskUniverse {
    #[serde(default)]
    pub risk_factors: Vec<RiskFactor>,
    #[serde(default)]
    pub counterparties: Vec<Counterparty>,
    #[serde(default)]
    pub contracts: Vec<Contract>,
}

impl RiskUniverse {
    pub fn new(
        risk_factors: Vec<RiskFactor>,
        counterparties: Vec<Counterparty>,
        contracts: Vec<Contract>,
    ) -> SgResult<Self> {
        let universe = Self {
            risk_factors,
            counterparties,
            contracts,
        };
        universe.validate()?;
        Ok(universe)
    }

    /// Check the factor id uniqueness invariant.
    pub fn validate(&self) -> SgResult<()> {
        let mut seen = HashSet::new();
        for factor in &self.risk_factors {
            if !seen.insert(factor.factor_id.as_str()) {
                return Err(SgError::Validation(format!(
                    "duplicate factor_id '{}' in risk universe",
                    factor.factor_id
                )));
            }
        }
        Ok(())
    }

    pub fn find_factor(&self, factor_id: &str) -> Option<&RiskFactor> {
        self.risk_factors.iter().find(|f| f.factor_id == factor_id)
    }

    pub fn factor_ids(&self) -> HashSet<&str> {
        self.risk_factors.iter().map(|f| f.factor_id.as_str()).collect()
    }

    /// Keep only the first `limit` contracts.
    pub fn truncate_contracts(&mut self, limit: usize) {
        self.contracts.truncate(limit);
    }

    pub fn is_empty(&self) -> bool {
        self.risk_factors.is_empty() && self.counterparties.is_empty() && self.contracts.is_empty()
    }
}
