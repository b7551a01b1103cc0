use serde::{Deserialize, Serialize};
use sg_types::{validation_error, RiskFactorKind, RiskUniverse, Scenario, ScenarioType, SgResult, Shock, ShockType};
use std::fmt;

/// How cross-checks against the universe are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    Off,
    /// Issues are logged and returned alongside the scenarios
    #[default]
    Advisory,
    /// Any issue fails the request
    Strict,
}

/// Shock magnitude limits and validation mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub mode: ValidationMode,
    pub max_rate_shock_bps: f64,
    pub max_spread_shock_bps: f64,
    /// Largest relative equity move, 0.5 = 50%
    pub max_equity_shock: f64,
    /// Largest relative FX move, 0.3 = 30%
    pub max_fx_shock: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            mode: ValidationMode::Advisory,
            max_rate_shock_bps: 500.0,
            max_spread_shock_bps: 500.0,
            max_equity_shock: 0.5,
            max_fx_shock: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingName,
    MissingDescription,
    ProbabilityOutOfRange,
    ProbabilityOnStress,
    UnknownScenarioType,
    UnknownFactor,
    FactorTypeMismatch,
    UnknownFactorType,
    UnknownShockType,
    MagnitudeExceeded,
}

/// A problem found in one scenario or shock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub scenario_index: usize,
    pub scenario_name: Option<String>,
    pub shock_index: Option<usize>,
    pub kind: IssueKind,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.scenario_name.as_deref().unwrap_or("<unnamed>");
        match self.shock_index {
            Some(shock) => write!(f, "scenario {} ({}), shock {}: {}", self.scenario_index, name, shock, self.message),
            None => write!(f, "scenario {} ({}): {}", self.scenario_index, name, self.message),
        }
    }
}

/// Cross-checks parsed scenarios against the universe they were generated for
#[derive(Debug, Clone, Default)]
pub struct ScenarioValidator {
    config: ValidationConfig,
}

impl ScenarioValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn mode(&self) -> ValidationMode {
        self.config.mode
    }

    /// All issues, in scenario then shock order. Empty when the mode is `Off`.
    pub fn validate(&self, scenarios: &[Scenario], universe: &RiskUniverse) -> Vec<ValidationIssue> {
        if self.config.mode == ValidationMode::Off {
            return Vec::new();
        }

        let mut issues = Vec::new();
        for (index, scenario) in scenarios.iter().enumerate() {
            let mut report = |shock_index: Option<usize>, kind: IssueKind, message: String| {
                issues.push(ValidationIssue {
                    scenario_index: index,
                    scenario_name: scenario.name.clone(),
                    shock_index,
                    kind,
                    message,
                });
            };

            if scenario.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
                report(None, IssueKind::MissingName, "missing name".to_string());
            }
            if scenario.description.as_deref().map_or(true, |d| d.trim().is_empty()) {
                report(None, IssueKind::MissingDescription, "missing description".to_string());
            }
            if let Some(tag) = &scenario.unrecognized_type {
                report(
                    None,
                    IssueKind::UnknownScenarioType,
                    format!("unknown scenario_type '{}', treated as stress", tag),
                );
            }
            if let Some(p) = scenario.probability {
                if !(0.0..=1.0).contains(&p) {
                    report(None, IssueKind::ProbabilityOutOfRange, format!("probability {} outside [0, 1]", p));
                }
                if scenario.scenario_type == ScenarioType::Stress {
                    report(None, IssueKind::ProbabilityOnStress, "probability set on a stress scenario".to_string());
                }
            }

            for (shock_index, shock) in scenario.shocks.iter().enumerate() {
                for (kind, message) in self.check_shock(shock, universe) {
                    report(Some(shock_index), kind, message);
                }
            }
        }

        for issue in &issues {
            tracing::warn!(kind = ?issue.kind, "scenario validation: {}", issue);
        }
        issues
    }

    /// Fails in strict mode when `issues` is non-empty.
    pub fn enforce(&self, issues: &[ValidationIssue]) -> SgResult<()> {
        match (self.config.mode, issues.first()) {
            (ValidationMode::Strict, Some(first)) => Err(validation_error!(
                "{} issue(s) in generated scenarios, first: {}",
                issues.len(),
                first
            )),
            _ => Ok(()),
        }
    }

    fn check_shock(&self, shock: &Shock, universe: &RiskUniverse) -> Vec<(IssueKind, String)> {
        let mut found = Vec::new();

        let declared = shock.factor_type.kind();
        if declared.is_none() {
            found.push((
                IssueKind::UnknownFactorType,
                format!("unknown factor_type '{}'", shock.factor_type),
            ));
        }
        if !shock.shock_type.is_known() {
            found.push((
                IssueKind::UnknownShockType,
                format!("unknown shock_type '{}'", shock.shock_type),
            ));
        }

        match universe.find_factor(&shock.factor_id) {
            None => found.push((
                IssueKind::UnknownFactor,
                format!("factor_id '{}' is not in the risk universe", shock.factor_id),
            )),
            Some(factor) => {
                if let Some(declared) = declared {
                    if declared != factor.kind() {
                        found.push((
                            IssueKind::FactorTypeMismatch,
                            format!(
                                "factor '{}' is a {} but the shock says {}",
                                shock.factor_id,
                                factor.kind(),
                                declared
                            ),
                        ));
                    }
                }
            }
        }

        if let Some(kind) = declared {
            if let Some(message) = self.magnitude_breach(kind, &shock.shock_type, shock.value) {
                found.push((IssueKind::MagnitudeExceeded, message));
            }
        }

        found
    }

    fn magnitude_breach(&self, kind: RiskFactorKind, shock_type: &ShockType, value: f64) -> Option<String> {
        let (limit_bps, label) = match kind {
            RiskFactorKind::YieldCurve => (self.config.max_rate_shock_bps, "rate"),
            RiskFactorKind::SpreadCurve => (self.config.max_spread_shock_bps, "spread"),
            RiskFactorKind::EquityIndex => {
                return relative_breach(shock_type, value, self.config.max_equity_shock, "equity");
            }
            RiskFactorKind::FxRate => {
                return relative_breach(shock_type, value, self.config.max_fx_shock, "FX");
            }
            RiskFactorKind::MacroFactor => return None,
        };

        let bps = match shock_type {
            ShockType::ParallelShiftBps => value.abs(),
            ShockType::ParallelShiftPct => value.abs() * 100.0,
            _ => return None,
        };
        (bps > limit_bps).then(|| format!("{} shock of {} bps exceeds limit of {} bps", label, bps, limit_bps))
    }
}

/// Relative move implied by a multiplicative factor or a percent shift.
fn relative_breach(shock_type: &ShockType, value: f64, limit: f64, label: &str) -> Option<String> {
    let relative = match shock_type {
        ShockType::Multiplicative => {
            if value <= 0.0 {
                return Some(format!("{} multiplicative factor {} must be positive", label, value));
            }
            (1.0 - value).abs()
        }
        ShockType::ParallelShiftPct => value.abs() / 100.0,
        _ => return None,
    };
    (relative > limit + 1e-9).then(|| {
        format!(
            "{} move of {:.1}% exceeds limit of {:.1}%",
            label,
            relative * 100.0,
            limit * 100.0
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_data::sample_universe;
    use sg_types::FactorType;

    fn validator(mode: ValidationMode) -> ScenarioValidator {
        ScenarioValidator::new(ValidationConfig {
            mode,
            ..ValidationConfig::default()
        })
    }

    fn kinds(issues: &[ValidationIssue]) -> Vec<IssueKind> {
        issues.iter().map(|i| i.kind).collect()
    }

    #[test]
    fn test_clean_scenario_has_no_issues() {
        let universe = sample_universe().unwrap();
        let scenario = Scenario::stress("Rate_Up", "Rates up 200 bps")
            .with_shock(Shock::new(RiskFactorKind::YieldCurve, "CHF_SWAP", ShockType::ParallelShiftBps, 200.0))
            .with_shock(Shock::new(RiskFactorKind::EquityIndex, "SMI", ShockType::Multiplicative, 0.5))
            .with_shock(Shock::new(RiskFactorKind::FxRate, "EURCHF", ShockType::Multiplicative, 1.3));

        assert!(validator(ValidationMode::Strict).validate(&[scenario], &universe).is_empty());
    }

    #[test]
    fn test_reference_and_tag_checks() {
        let universe = sample_universe().unwrap();
        let scenario = Scenario::stress("Mixed", "Bad references")
            .with_shock(Shock::new(RiskFactorKind::YieldCurve, "USD_SOFR", ShockType::ParallelShiftBps, 100.0))
            .with_shock(Shock::new(RiskFactorKind::YieldCurve, "SMI", ShockType::ParallelShiftBps, 100.0))
            .with_shock(Shock::new(FactorType::from("commodity"), "EURCHF", ShockType::from("jump"), 1.0));

        let issues = validator(ValidationMode::Advisory).validate(&[scenario], &universe);
        assert_eq!(
            kinds(&issues),
            vec![
                IssueKind::UnknownFactor,
                IssueKind::FactorTypeMismatch,
                IssueKind::UnknownFactorType,
                IssueKind::UnknownShockType,
            ]
        );
        assert_eq!(issues[1].shock_index, Some(1));
    }

    #[test]
    fn test_magnitude_limits() {
        let universe = sample_universe().unwrap();
        let scenario = Scenario::stress("Extreme", "Beyond limits")
            .with_shock(Shock::new(RiskFactorKind::YieldCurve, "CHF_SWAP", ShockType::ParallelShiftBps, -600.0))
            .with_shock(Shock::new(RiskFactorKind::SpreadCurve, "CHF_CORP_A", ShockType::ParallelShiftPct, 6.0))
            .with_shock(Shock::new(RiskFactorKind::EquityIndex, "SMI", ShockType::Multiplicative, 0.4))
            .with_shock(Shock::new(RiskFactorKind::FxRate, "EURCHF", ShockType::ParallelShiftPct, -35.0))
            .with_shock(Shock::new(RiskFactorKind::MacroFactor, "CH_GDP_GROWTH", ShockType::AbsoluteChange, -9.0));

        let issues = validator(ValidationMode::Advisory).validate(&[scenario], &universe);
        assert_eq!(kinds(&issues), vec![IssueKind::MagnitudeExceeded; 4]);
        let shocks: Vec<Option<usize>> = issues.iter().map(|i| i.shock_index).collect();
        assert_eq!(shocks, vec![Some(0), Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_scenario_level_checks() {
        let universe = RiskUniverse::default();
        let mut unnamed = Scenario::stress("", "");
        unnamed.name = None;
        let mut stress_with_probability = Scenario::stress("S", "d");
        stress_with_probability.probability = Some(0.2);
        let bad_probability = Scenario::stochastic("P", "d", 1.5);

        let issues = validator(ValidationMode::Advisory)
            .validate(&[unnamed, stress_with_probability, bad_probability], &universe);
        assert_eq!(
            kinds(&issues),
            vec![
                IssueKind::MissingName,
                IssueKind::MissingDescription,
                IssueKind::ProbabilityOnStress,
                IssueKind::ProbabilityOutOfRange,
            ]
        );
        assert_eq!(issues[3].scenario_index, 2);
    }

    #[test]
    fn test_unknown_scenario_type_is_reported() {
        let universe = sample_universe().unwrap();
        let mut scenario = Scenario::stress("Odd", "Mislabelled type")
            .with_shock(Shock::new(RiskFactorKind::YieldCurve, "CHF_SWAP", ShockType::ParallelShiftBps, 100.0));
        scenario.unrecognized_type = Some("stress_test".to_string());

        let advisory = validator(ValidationMode::Advisory);
        let issues = advisory.validate(&[scenario.clone()], &universe);
        assert_eq!(kinds(&issues), vec![IssueKind::UnknownScenarioType]);
        assert!(issues[0].message.contains("stress_test"));
        assert!(advisory.enforce(&issues).is_ok());

        let strict = validator(ValidationMode::Strict);
        let issues = strict.validate(&[scenario], &universe);
        assert!(strict.enforce(&issues).unwrap_err().is_validation());
    }

    #[test]
    fn test_modes() {
        let universe = RiskUniverse::default();
        let scenario = Scenario::stress("Ghost", "Unknown factor")
            .with_shock(Shock::new(RiskFactorKind::FxRate, "GBPCHF", ShockType::Multiplicative, 0.9));

        assert!(validator(ValidationMode::Off).validate(&[scenario.clone()], &universe).is_empty());

        let advisory = validator(ValidationMode::Advisory);
        let issues = advisory.validate(&[scenario.clone()], &universe);
        assert_eq!(issues.len(), 1);
        assert!(advisory.enforce(&issues).is_ok());

        let strict = validator(ValidationMode::Strict);
        let issues = strict.validate(&[scenario], &universe);
        let err = strict.enforce(&issues).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("GBPCHF"));
    }
}
