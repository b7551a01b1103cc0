use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the profile used when none is requested or a name is unknown.
pub const DEFAULT_PROFILE: &str = "default";

/// Persona and guideline text placed at the top of a prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum BehaviorProfile {
    /// Resolved through a [`ProfileStore`]
    Named(String),
    /// Used as given
    Verbatim(String),
}

impl BehaviorProfile {
    pub fn named(name: &str) -> Self {
        BehaviorProfile::Named(name.to_string())
    }

    pub fn verbatim(text: &str) -> Self {
        BehaviorProfile::Verbatim(text.to_string())
    }
}

impl Default for BehaviorProfile {
    fn default() -> Self {
        BehaviorProfile::Named(DEFAULT_PROFILE.to_string())
    }
}

impl fmt::Display for BehaviorProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BehaviorProfile::Named(name) => write!(f, "{}", name),
            BehaviorProfile::Verbatim(text) => write!(f, "<verbatim, {} chars>", text.len()),
        }
    }
}

/// Profile listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileInfo {
    pub name: String,
    pub description: String,
}

/// Resolves profile names to prompt-prefix text
pub trait ProfileStore: Send + Sync {
    /// Text for `name`, if the store knows it.
    fn lookup(&self, name: &str) -> Option<String>;

    /// Available profiles with one-line descriptions.
    fn list(&self) -> Vec<ProfileInfo>;

    /// Text for `profile`. Unknown names fall back to the default profile.
    fn resolve(&self, profile: &BehaviorProfile) -> String {
        match profile {
            BehaviorProfile::Verbatim(text) => text.clone(),
            BehaviorProfile::Named(name) => match self.lookup(name) {
                Some(text) => text,
                None => {
                    tracing::warn!(profile = %name, "unknown behavior profile, using default");
                    self.lookup(DEFAULT_PROFILE).unwrap_or_else(|| BUILTIN[0].text.to_string())
                }
            },
        }
    }
}

struct BuiltinProfile {
    name: &'static str,
    description: &'static str,
    text: &'static str,
}

const BUILTIN: [BuiltinProfile; 6] = [
    BuiltinProfile {
        name: "default",
        description: "Balanced ALM expert for general purpose scenarios",
        text: "You are an expert quantitative risk analyst specializing in Asset-Liability Management (ALM) and scenario generation.

EXPERTISE:
- Interest rate, credit and market risk in banking books
- Regulatory stress testing frameworks (Basel III, FINMA, EBA)
- Correlation structures that emerge during stress

SHOCK MAGNITUDE GUIDELINES:
- Interest rates: mild +/-50 bps, moderate +/-100-150 bps, severe +/-200-300 bps
- Credit spreads: mild +50 bps, moderate +100-150 bps, severe +200-300 bps
- FX rates: mild +/-5%, moderate +/-10-15%, severe +/-20-30%
- Equity indices: mild -10-15%, moderate -20-30%, severe -40-50%

Generate severe but plausible, internally consistent scenarios grounded in historical precedent.",
    },
    BuiltinProfile {
        name: "conservative",
        description: "Worst-case analyst favouring the upper end of shock ranges",
        text: "You are a CONSERVATIVE risk analyst focused on tail risk and worst-case outcomes.

APPROACH:
- Prefer the upper end of every plausible shock range
- Assume correlations move against the institution under stress
- Combine rate, credit and liquidity stress rather than isolating them

SHOCK MAGNITUDE GUIDELINES:
- Interest rates: +/-250-400 bps
- Credit spreads: +250-400 bps, larger for sub-investment grade
- FX rates: +/-20-30%
- Equity indices: -40-50%

Every scenario must be severe yet defensible to a risk committee.",
    },
    BuiltinProfile {
        name: "regulatory",
        description: "Compliance specialist targeting FINMA, EBA and Basel IRRBB requirements",
        text: "You are a regulatory compliance specialist for ALM stress testing.

REQUIREMENTS:
- Cover the six Basel IRRBB rate shock scenarios where rates are present: parallel up, parallel down, steepener, flattener, short rate up, short rate down
- Use supervisory shock sizes (for CHF and EUR typically 200-250 bps parallel, 300 bps short rate)
- Pair rate shocks with credit spread widening consistent with supervisory adverse scenarios
- Name scenarios so they can be traced to the regulatory requirement they satisfy

Descriptions must state which requirement each scenario addresses.",
    },
    BuiltinProfile {
        name: "historical",
        description: "Financial historian replaying past crises (2008, 2015, 2020, 2022)",
        text: "You are a financial historian specializing in market crises.

REFERENCE EVENTS:
- 2008 global financial crisis: credit spreads +300-400 bps, equities -50%, policy rates cut sharply
- 2011 euro sovereign crisis: periphery spreads +500 bps, EUR weakness, safe-haven CHF demand
- 2015 SNB floor removal: CHF +15-20% overnight, Swiss equities -10%
- 2020 COVID-19: policy rates to zero, credit spreads +200 bps, equities -30% then rebound
- 2022 inflation shock: rates +300-400 bps within a year

Base each scenario on a named historical episode and scale it to the current risk state.",
    },
    BuiltinProfile {
        name: "swiss",
        description: "Swiss banking expert with CHF and mortgage market focus",
        text: "You are an expert in Swiss banking ALM with deep knowledge of CHF markets and the FINMA regime.

FOCUS:
- CHF safe-haven dynamics: sudden appreciation against EUR and USD under global stress
- SNB policy: negative rate episodes, currency interventions, floor and corridor changes
- Swiss mortgage and real estate exposure, deposit outflow and repricing behaviour
- SMI concentration in exporters sensitive to CHF strength

Keep CHF rate shocks realistic for a low-rate currency (typically +/-100-200 bps) and pair FX moves with their equity and rate consequences.",
    },
    BuiltinProfile {
        name: "stochastic",
        description: "Quant analyst producing probability-weighted scenarios",
        text: "You are a quantitative analyst generating probability-weighted scenarios for simulation.

APPROACH:
- Spread scenarios across the distribution: central, moderate adverse, tail
- Attach a probability in [0, 1] to every scenario; probabilities should reflect relative likelihood
- Keep shocks consistent with historical volatilities and cross-factor correlations
- Use smaller magnitudes for likely scenarios and reserve extreme moves for low probabilities

Every scenario must carry scenario_type \"stochastic\" and a probability.",
    },
];

/// The profiles compiled into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinProfiles;

impl ProfileStore for BuiltinProfiles {
    fn lookup(&self, name: &str) -> Option<String> {
        let name = name.trim();
        BUILTIN
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| p.text.to_string())
    }

    fn list(&self) -> Vec<ProfileInfo> {
        BUILTIN
            .iter()
            .map(|p| ProfileInfo {
                name: p.name.to_string(),
                description: p.description.to_string(),
            })
            .collect()
    }
}
