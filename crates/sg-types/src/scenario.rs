use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::risk_factors::RiskFactorKind;

/// Risk factor tag carried by a shock.
///
/// Backend output is copied verbatim, so tags outside the known set are kept
/// in `Other` instead of being rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FactorType {
    Known(RiskFactorKind),
    Other(String),
}

impl FactorType {
    pub fn as_str(&self) -> &str {
        match self {
            FactorType::Known(kind) => kind.as_str(),
            FactorType::Other(tag) => tag,
        }
    }

    pub fn kind(&self) -> Option<RiskFactorKind> {
        match self {
            FactorType::Known(kind) => Some(*kind),
            FactorType::Other(_) => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, FactorType::Known(_))
    }
}

impl From<&str> for FactorType {
    fn from(tag: &str) -> Self {
        match RiskFactorKind::from_tag(tag) {
            Some(kind) => FactorType::Known(kind),
            None => FactorType::Other(tag.to_string()),
        }
    }
}

impl From<RiskFactorKind> for FactorType {
    fn from(kind: RiskFactorKind) -> Self {
        FactorType::Known(kind)
    }
}

/// Perturbation type; the unit of `Shock::value` depends on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ShockType {
    /// Additive shift in basis points.
    ParallelShiftBps,
    /// Additive shift in percentage points.
    ParallelShiftPct,
    Twist,
    Butterfly,
    /// Factor applied to the current level (0.80 = -20%).
    Multiplicative,
    AbsoluteChange,
    Other(String),
}

impl ShockType {
    pub const KNOWN: [ShockType; 6] = [
        ShockType::ParallelShiftBps,
        ShockType::ParallelShiftPct,
        ShockType::Twist,
        ShockType::Butterfly,
        ShockType::Multiplicative,
        ShockType::AbsoluteChange,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ShockType::ParallelShiftBps => "parallel_shift_bps",
            ShockType::ParallelShiftPct => "parallel_shift_pct",
            ShockType::Twist => "twist",
            ShockType::Butterfly => "butterfly",
            ShockType::Multiplicative => "multiplicative",
            ShockType::AbsoluteChange => "absolute_change",
            ShockType::Other(tag) => tag,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ShockType::Other(_))
    }
}

impl From<&str> for ShockType {
    fn from(tag: &str) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|known| known.as_str() == tag)
            .unwrap_or_else(|| ShockType::Other(tag.to_string()))
    }
}

macro_rules! string_tag_serde {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let tag = String::deserialize(deserializer)?;
                Ok(<$ty>::from(tag.as_str()))
            }
        }
    };
}

string_tag_serde!(FactorType);
string_tag_serde!(ShockType);

/// Stress (narrative, deterministic) or stochastic (carries a probability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioType {
    #[default]
    Stress,
    Stochastic,
}

impl ScenarioType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioType::Stress => "stress",
            ScenarioType::Stochastic => "stochastic",
        }
    }
}

impl fmt::Display for ScenarioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One perturbation instruction against a single risk factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shock {
    pub factor_type: FactorType,
    /// Should name a factor of the originating universe; not enforced here.
    pub factor_id: String,
    pub shock_type: ShockType,
    pub value: f64,
    #[serde(default)]
    pub description: Option<String>,
}

impl Shock {
    pub fn new(factor_type: impl Into<FactorType>, factor_id: &str, shock_type: ShockType, value: f64) -> Self {
        Self {
            factor_type: factor_type.into(),
            factor_id: factor_id.to_string(),
            shock_type,
            value,
            description: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// A named bundle of shocks. Shock order is the narrative order and is never
/// re-sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub scenario_type: ScenarioType,
    #[serde(default)]
    pub probability: Option<f64>,
    #[serde(default)]
    pub shocks: Vec<Shock>,
    /// Type tag as written by the backend when it was neither stress nor
    /// stochastic; `scenario_type` then holds the stress default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unrecognized_type: Option<String>,
}

impl Scenario {
    pub fn stress(name: &str, description: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            description: Some(description.to_string()),
            scenario_type: ScenarioType::Stress,
            probability: None,
            shocks: Vec::new(),
            unrecognized_type: None,
        }
    }

    pub fn stochastic(name: &str, description: &str, probability: f64) -> Self {
        Self {
            name: Some(name.to_string()),
            description: Some(description.to_string()),
            scenario_type: ScenarioType::Stochastic,
            probability: Some(probability),
            shocks: Vec::new(),
            unrecognized_type: None,
        }
    }

    pub fn with_shock(mut self, shock: Shock) -> Self {
        self.shocks.push(shock);
        self
    }

    /// Probability, only when the scenario is stochastic.
    pub fn effective_probability(&self) -> Option<f64> {
        match self.scenario_type {
            ScenarioType::Stochastic => self.probability,
            ScenarioType::Stress => None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}
