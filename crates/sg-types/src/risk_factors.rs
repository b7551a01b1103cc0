use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant of the risk factor variants.
///
/// The declaration order is also the order in which variants are grouped when
/// a universe is summarized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactorKind {
    YieldCurve,
    SpreadCurve,
    FxRate,
    EquityIndex,
    MacroFactor,
}

impl RiskFactorKind {
    pub const ALL: [RiskFactorKind; 5] = [
        RiskFactorKind::YieldCurve,
        RiskFactorKind::SpreadCurve,
        RiskFactorKind::FxRate,
        RiskFactorKind::EquityIndex,
        RiskFactorKind::MacroFactor,
    ];

    /// Wire tag used in payloads and prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskFactorKind::YieldCurve => "yield_curve",
            RiskFactorKind::SpreadCurve => "spread_curve",
            RiskFactorKind::FxRate => "fx_rate",
            RiskFactorKind::EquityIndex => "equity_index",
            RiskFactorKind::MacroFactor => "macro_factor",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

impl fmt::Display for RiskFactorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named market or macro observable that scenarios can perturb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub factor_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub data: RiskFactorData,
}

/// Variant-specific payload, tagged by `factor_type` on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "factor_type", rename_all = "snake_case")]
pub enum RiskFactorData {
    /// Term structure of interest rates, rates in percent.
    YieldCurve {
        #[serde(default)]
        tenors: Vec<String>,
        #[serde(default)]
        rates: Vec<f64>,
    },
    /// Credit or liquidity spread curve, spreads in basis points.
    SpreadCurve {
        #[serde(default)]
        rating: Option<String>,
        #[serde(default = "default_spread_type")]
        spread_type: String,
        #[serde(default)]
        tenors: Vec<String>,
        #[serde(default)]
        spreads: Vec<f64>,
    },
    FxRate {
        #[serde(default)]
        currency_pair: String,
        #[serde(default)]
        base_currency: String,
        #[serde(default)]
        quote_currency: String,
        #[serde(default)]
        spot_rate: Option<f64>,
    },
    EquityIndex {
        #[serde(default)]
        index_name: String,
        #[serde(default)]
        current_level: Option<f64>,
    },
    /// GDP growth, inflation, unemployment and similar indicators.
    MacroFactor {
        #[serde(default)]
        macro_type: String,
        #[serde(default)]
        current_value: Option<f64>,
        #[serde(default = "default_unit")]
        unit: String,
    },
}

fn default_spread_type() -> String {
    "credit".to_string()
}

fn default_unit() -> String {
    "%".to_string()
}

impl RiskFactor {
    pub fn yield_curve(factor_id: &str, currency: &str, tenors: &[&str], rates: &[f64]) -> Self {
        Self {
            factor_id: factor_id.to_string(),
            currency: Some(currency.to_string()),
            description: String::new(),
            data: RiskFactorData::YieldCurve {
                tenors: tenors.iter().map(|t| t.to_string()).collect(),
                rates: rates.to_vec(),
            },
        }
    }

    pub fn spread_curve(
        factor_id: &str,
        currency: &str,
        rating: &str,
        tenors: &[&str],
        spreads: &[f64],
    ) -> Self {
        Self {
            factor_id: factor_id.to_string(),
            currency: Some(currency.to_string()),
            description: String::new(),
            data: RiskFactorData::SpreadCurve {
                rating: Some(rating.to_string()),
                spread_type: default_spread_type(),
                tenors: tenors.iter().map(|t| t.to_string()).collect(),
                spreads: spreads.to_vec(),
            },
        }
    }

    pub fn fx_rate(factor_id: &str, base_currency: &str, quote_currency: &str, spot_rate: f64) -> Self {
        Self {
            factor_id: factor_id.to_string(),
            currency: Some(quote_currency.to_string()),
            description: String::new(),
            data: RiskFactorData::FxRate {
                currency_pair: format!("{}{}", base_currency, quote_currency),
                base_currency: base_currency.to_string(),
                quote_currency: quote_currency.to_string(),
                spot_rate: Some(spot_rate),
            },
        }
    }

    pub fn equity_index(factor_id: &str, index_name: &str, current_level: f64) -> Self {
        Self {
            factor_id: factor_id.to_string(),
            currency: None,
            description: String::new(),
            data: RiskFactorData::EquityIndex {
                index_name: index_name.to_string(),
                current_level: Some(current_level),
            },
        }
    }

    pub fn macro_factor(factor_id: &str, macro_type: &str, current_value: f64, unit: &str) -> Self {
        Self {
            factor_id: factor_id.to_string(),
            currency: None,
            description: String::new(),
            data: RiskFactorData::MacroFactor {
                macro_type: macro_type.to_string(),
                current_value: Some(current_value),
                unit: unit.to_string(),
            },
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_currency(mut self, currency: Option<&str>) -> Self {
        self.currency = currency.map(|c| c.to_string());
        self
    }

    pub fn kind(&self) -> RiskFactorKind {
        self.data.kind()
    }

    /// Mean of the curve points (rates for yield curves, spreads for spread
    /// curves). `None` for point factors and for curves without points.
    pub fn curve_average(&self) -> Option<f64> {
        match &self.data {
            RiskFactorData::YieldCurve { rates, .. } => mean(rates),
            RiskFactorData::SpreadCurve { spreads, .. } => mean(spreads),
            _ => None,
        }
    }

    /// Current level of a point factor (spot, index level, indicator value).
    pub fn current_value(&self) -> Option<f64> {
        match &self.data {
            RiskFactorData::FxRate { spot_rate, .. } => *spot_rate,
            RiskFactorData::EquityIndex { current_level, .. } => *current_level,
            RiskFactorData::MacroFactor { current_value, .. } => *current_value,
            _ => None,
        }
    }

    /// Number of curve points, zero for point factors.
    pub fn tenor_count(&self) -> usize {
        match &self.data {
            RiskFactorData::YieldCurve { tenors, .. } | RiskFactorData::SpreadCurve { tenors, .. } => {
                tenors.len()
            }
            _ => 0,
        }
    }
}

impl RiskFactorData {
    pub fn kind(&self) -> RiskFactorKind {
        match self {
            RiskFactorData::YieldCurve { .. } => RiskFactorKind::YieldCurve,
            RiskFactorData::SpreadCurve { .. } => RiskFactorKind::SpreadCurve,
            RiskFactorData::FxRate { .. } => RiskFactorKind::FxRate,
            RiskFactorData::EquityIndex { .. } => RiskFactorKind::EquityIndex,
            RiskFactorData::MacroFactor { .. } => RiskFactorKind::MacroFactor,
        }
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(RiskFactorKind::FxRate.as_str(), "fx_rate");
        assert_eq!(RiskFactorKind::from_tag("macro_factor"), Some(RiskFactorKind::MacroFactor));
        assert_eq!(RiskFactorKind::from_tag("equity_price"), None);
        assert!(RiskFactorKind::YieldCurve < RiskFactorKind::MacroFactor);
    }

    #[test]
    fn test_curve_average() {
        let curve = RiskFactor::yield_curve("CHF_SWAP", "CHF", &["1Y", "5Y"], &[1.0, 2.0]);
        assert_eq!(curve.curve_average(), Some(1.5));
        assert_eq!(curve.tenor_count(), 2);
        assert_eq!(curve.current_value(), None);

        let empty = RiskFactor::yield_curve("EMPTY", "CHF", &[], &[]);
        assert_eq!(empty.curve_average(), None);
    }

    #[test]
    fn test_point_factors() {
        let fx = RiskFactor::fx_rate("EURCHF", "EUR", "CHF", 0.95);
        assert_eq!(fx.kind(), RiskFactorKind::FxRate);
        assert_eq!(fx.current_value(), Some(0.95));
        match &fx.data {
            RiskFactorData::FxRate { currency_pair, .. } => assert_eq!(currency_pair, "EURCHF"),
            _ => panic!("Expected FX rate"),
        }
    }

    #[test]
    fn test_wire_format_is_tagged_by_factor_type() {
        let json = r#"{
            "factor_id": "CH_GDP_GROWTH",
            "factor_type": "macro_factor",
            "macro_type": "GDP_GROWTH",
            "current_value": 1.8
        }"#;
        let factor: RiskFactor = serde_json::from_str(json).unwrap();
        assert_eq!(factor.kind(), RiskFactorKind::MacroFactor);
        assert_eq!(factor.currency, None);
        match &factor.data {
            RiskFactorData::MacroFactor { unit, .. } => assert_eq!(unit, "%"),
            _ => panic!("Expected macro factor"),
        }

        let value = serde_json::to_value(RiskFactor::equity_index("SMI", "Swiss Market Index", 11500.0)).unwrap();
        assert_eq!(value["factor_type"], "equity_index");
        assert_eq!(value["current_level"], 11500.0);
    }
}
