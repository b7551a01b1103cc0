use serde::{Deserialize, Serialize};

/// Obligor with credit risk attributes.
///
/// `pd` and `recovery_rate` are decimals (0.02 = 2%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counterparty {
    pub counterparty_id: String,
    pub name: String,
    pub rating: String,
    pub pd: f64,
    pub recovery_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Counterparty {
    pub fn new(counterparty_id: &str, name: &str, rating: &str, pd: f64, recovery_rate: f64) -> Self {
        Self {
            counterparty_id: counterparty_id.to_string(),
            name: name.to_string(),
            rating: rating.to_string(),
            pd,
            recovery_rate,
            sector: None,
            country: None,
        }
    }

    pub fn with_sector(mut self, sector: &str) -> Self {
        self.sector = Some(sector.to_string());
        self
    }

    pub fn with_country(mut self, country: &str) -> Self {
        self.country = Some(country.to_string());
        self
    }

    /// Loss given default
    pub fn lgd(&self) -> f64 {
        1.0 - self.recovery_rate
    }

    /// True when both `pd` and `recovery_rate` lie in [0, 1].
    pub fn is_well_formed(&self) -> bool {
        (0.0..=1.0).contains(&self.pd) && (0.0..=1.0).contains(&self.recovery_rate)
    }
}
