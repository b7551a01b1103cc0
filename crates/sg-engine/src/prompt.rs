use serde::{Deserialize, Serialize};
use sg_types::{
    config_error, Contract, Counterparty, RiskFactor, RiskFactorKind, Scenario, SgError, Shock, ShockType,
};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::interpreter::ScenarioPayload;
use crate::profiles::{BehaviorProfile, BuiltinProfiles, ProfileStore};
use crate::summarizer::Summarizer;

/// Kind of scenarios a caller asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestedScenarioType {
    #[default]
    Stress,
    Stochastic,
    /// A mix of stress and stochastic scenarios
    Both,
}

impl RequestedScenarioType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestedScenarioType::Stress => "stress",
            RequestedScenarioType::Stochastic => "stochastic",
            RequestedScenarioType::Both => "both",
        }
    }
}

impl fmt::Display for RequestedScenarioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestedScenarioType {
    type Err = SgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stress" => Ok(RequestedScenarioType::Stress),
            "stochastic" => Ok(RequestedScenarioType::Stochastic),
            "both" => Ok(RequestedScenarioType::Both),
            other => Err(config_error!("unknown scenario type '{}'", other)),
        }
    }
}

const RULE_WIDTH: usize = 70;

/// Assembles the full request text sent to the generative backend
#[derive(Clone)]
pub struct PromptBuilder {
    summarizer: Summarizer,
    profiles: Arc<dyn ProfileStore>,
}

impl fmt::Debug for PromptBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptBuilder")
            .field("summarizer", &self.summarizer)
            .finish_non_exhaustive()
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(Summarizer::default(), Arc::new(BuiltinProfiles))
    }
}

impl PromptBuilder {
    pub fn new(summarizer: Summarizer, profiles: Arc<dyn ProfileStore>) -> Self {
        Self { summarizer, profiles }
    }

    pub fn summarizer(&self) -> &Summarizer {
        &self.summarizer
    }

    pub fn profiles(&self) -> &dyn ProfileStore {
        self.profiles.as_ref()
    }

    /// Build the prompt. Identical inputs always give identical text.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        &self,
        risk_factors: &[RiskFactor],
        counterparties: &[Counterparty],
        contracts: &[Contract],
        instruction: &str,
        count: usize,
        scenario_type: RequestedScenarioType,
        profile: &BehaviorProfile,
    ) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut parts: Vec<String> = Vec::new();

        parts.push(self.profiles.resolve(profile));
        parts.push(String::new());

        section(&mut parts, &rule, "CURRENT RISK FACTOR STATE");
        parts.push(self.summarizer.summarize_risk_factors(risk_factors));
        parts.push(String::new());
        parts.push(self.summarizer.summarize_counterparties(counterparties));
        parts.push(String::new());
        parts.push(self.summarizer.summarize_portfolio(contracts));
        parts.push(String::new());

        section(&mut parts, &rule, "SCENARIO GENERATION REQUEST");
        parts.push(format!("Scenario Type: {}", scenario_type.as_str().to_uppercase()));
        parts.push(format!("Number of Scenarios: {}", count));
        parts.push(String::new());
        parts.push("User Instruction:".to_string());
        parts.push(instruction.trim().to_string());
        parts.push(String::new());

        section(&mut parts, &rule, "OUTPUT FORMAT REQUIREMENTS");
        parts.push("Respond with a single JSON object shaped exactly like this example:".to_string());
        parts.push(String::new());
        parts.push(worked_example(scenario_type));
        parts.push(String::new());
        parts.push(format!("Allowed factor_type values: {}", factor_type_values()));
        parts.push(format!("Allowed shock_type values: {}", shock_type_values()));
        parts.push(String::new());

        section(&mut parts, &rule, "CRITICAL INSTRUCTIONS");
        let instructions = [
            "Use ONLY factor_id values that appear in the risk factors listed above".to_string(),
            "For yield_curve and spread_curve shocks, use 'parallel_shift_bps' (value in basis points, e.g. 200 for +200 bps)".to_string(),
            "For fx_rate shocks, use 'multiplicative' (e.g. 1.15 for +15%, 0.85 for -15%)".to_string(),
            "For equity_index shocks, use 'multiplicative' (e.g. 0.70 for a 30% drop)".to_string(),
            "For macro_factor shocks, use 'absolute_change' (change in the factor's own unit)".to_string(),
            probability_instruction(scenario_type).to_string(),
            format!("Generate exactly {} scenarios", count),
            "Keep shocks realistic and internally consistent, and explain the economic drivers in each description".to_string(),
            "Output ONLY the JSON object, with no text before or after it and no comments inside it".to_string(),
        ];
        for (i, line) in instructions.iter().enumerate() {
            parts.push(format!("{}. {}", i + 1, line));
        }
        parts.push(String::new());
        parts.push("Generate the scenarios now:".to_string());

        let prompt = parts.join("\n");
        tracing::debug!(
            profile = %profile,
            scenario_type = %scenario_type,
            count,
            chars = prompt.len(),
            "prompt built"
        );
        prompt
    }
}

fn section(parts: &mut Vec<String>, rule: &str, title: &str) {
    parts.push(rule.to_string());
    parts.push(title.to_string());
    parts.push(rule.to_string());
}

fn probability_instruction(scenario_type: RequestedScenarioType) -> &'static str {
    match scenario_type {
        RequestedScenarioType::Stress => {
            "Every scenario must have scenario_type \"stress\" and probability null"
        }
        RequestedScenarioType::Stochastic => {
            "Every scenario must have scenario_type \"stochastic\" and a probability between 0 and 1"
        }
        RequestedScenarioType::Both => {
            "Mix \"stress\" scenarios (probability null) with \"stochastic\" scenarios (probability between 0 and 1)"
        }
    }
}

fn factor_type_values() -> String {
    RiskFactorKind::ALL
        .iter()
        .map(|kind| kind.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn shock_type_values() -> String {
    ShockType::KNOWN
        .iter()
        .map(|shock_type| shock_type.as_str().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Example payload built from the same types the interpreter reads back.
fn worked_example(scenario_type: RequestedScenarioType) -> String {
    let stress = Scenario::stress(
        "Scenario_Name_Here",
        "Detailed description of the scenario and its economic drivers",
    )
    .with_shock(
        Shock::new(RiskFactorKind::YieldCurve, "EXACT_YIELD_CURVE_ID", ShockType::ParallelShiftBps, 200.0)
            .with_description("Brief description of this shock"),
    )
    .with_shock(
        Shock::new(RiskFactorKind::EquityIndex, "EXACT_EQUITY_INDEX_ID", ShockType::Multiplicative, 0.7)
            .with_description("30% equity decline"),
    );

    let stochastic = Scenario::stochastic(
        "Scenario_Name_Here",
        "Detailed description of the scenario and its economic drivers",
        0.05,
    )
    .with_shock(
        Shock::new(RiskFactorKind::FxRate, "EXACT_FX_RATE_ID", ShockType::Multiplicative, 0.9)
            .with_description("10% depreciation of the base currency"),
    );

    let scenarios = match scenario_type {
        RequestedScenarioType::Stress => vec![stress],
        RequestedScenarioType::Stochastic => vec![stochastic],
        RequestedScenarioType::Both => vec![stress, stochastic],
    };

    ScenarioPayload::from_scenarios(&scenarios).to_pretty_json()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;
    use sg_data::sample_universe;

    fn build_sample(scenario_type: RequestedScenarioType, profile: &BehaviorProfile) -> String {
        let universe = sample_universe().unwrap();
        PromptBuilder::default().build(
            &universe.risk_factors,
            &universe.counterparties,
            &universe.contracts,
            "Severe CHF rate shock with credit deterioration",
            5,
            scenario_type,
            profile,
        )
    }

    #[test]
    fn test_build_is_deterministic() {
        let profile = BehaviorProfile::default();
        assert_eq!(
            build_sample(RequestedScenarioType::Stress, &profile),
            build_sample(RequestedScenarioType::Stress, &profile)
        );
    }

    #[test]
    fn test_prompt_sections_in_order() {
        let prompt = build_sample(RequestedScenarioType::Stress, &BehaviorProfile::default());
        let positions: Vec<usize> = [
            "expert quantitative risk analyst",
            "CURRENT RISK FACTOR STATE",
            "RISK FACTORS:",
            "COUNTERPARTIES:",
            "PORTFOLIO SUMMARY:",
            "SCENARIO GENERATION REQUEST",
            "OUTPUT FORMAT REQUIREMENTS",
            "CRITICAL INSTRUCTIONS",
        ]
        .iter()
        .map(|marker| prompt.find(marker).unwrap_or_else(|| panic!("missing {marker}")))
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        assert!(prompt.contains("Scenario Type: STRESS"));
        assert!(prompt.contains("Number of Scenarios: 5"));
        assert!(prompt.contains("Severe CHF rate shock with credit deterioration"));
        assert!(prompt.contains("  - CHF_SWAP (CHF)"));
        assert!(prompt.contains("Output ONLY the JSON object"));
        assert!(prompt.ends_with("Generate the scenarios now:"));
    }

    #[test]
    fn test_enumerations_listed() {
        let prompt = build_sample(RequestedScenarioType::Stress, &BehaviorProfile::default());
        assert!(prompt.contains(
            "Allowed factor_type values: yield_curve, spread_curve, fx_rate, equity_index, macro_factor"
        ));
        assert!(prompt.contains(
            "Allowed shock_type values: parallel_shift_bps, parallel_shift_pct, twist, butterfly, multiplicative, absolute_change"
        ));
    }

    #[test]
    fn test_worked_example_parses_back() {
        for scenario_type in [
            RequestedScenarioType::Stress,
            RequestedScenarioType::Stochastic,
            RequestedScenarioType::Both,
        ] {
            let example = worked_example(scenario_type);
            for field in [
                "\"name\"",
                "\"description\"",
                "\"scenario_type\"",
                "\"probability\"",
                "\"shocks\"",
                "\"factor_type\"",
                "\"factor_id\"",
                "\"shock_type\"",
                "\"value\"",
            ] {
                assert!(example.contains(field), "{field} missing from example");
            }

            let scenarios = Interpreter::default().interpret(&example).unwrap();
            let expected = if scenario_type == RequestedScenarioType::Both { 2 } else { 1 };
            assert_eq!(scenarios.len(), expected);
        }
    }

    #[test]
    fn test_verbatim_profile_leads_prompt() {
        let prompt = build_sample(
            RequestedScenarioType::Stochastic,
            &BehaviorProfile::verbatim("You are a cautious treasurer."),
        );
        assert!(prompt.starts_with("You are a cautious treasurer.\n"));
        assert!(prompt.contains("Scenario Type: STOCHASTIC"));
        assert!(prompt.contains("\"probability\": 0.05"));
    }

    #[test]
    fn test_requested_type_parsing() {
        assert_eq!("Both".parse::<RequestedScenarioType>().unwrap(), RequestedScenarioType::Both);
        assert!("monte_carlo".parse::<RequestedScenarioType>().unwrap_err().is_config());
    }
}
