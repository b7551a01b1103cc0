use serde::{Deserialize, Serialize};
use sg_types::{FactorType, ParseError, Scenario, ScenarioType, SgResult, Shock, ShockType};

/// Top-level object the backend is asked to produce
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioPayload {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub scenarios: Vec<ScenarioRecord>,
}

/// One scenario as it appears on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub scenario_type: Option<String>,
    #[serde(default)]
    pub probability: Option<f64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub shocks: Vec<ShockRecord>,
}

/// One shock as it appears on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShockRecord {
    pub factor_type: FactorType,
    pub factor_id: String,
    pub shock_type: ShockType,
    pub value: f64,
    #[serde(default)]
    pub description: Option<String>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ScenarioPayload {
    pub fn from_scenarios(scenarios: &[Scenario]) -> Self {
        Self {
            scenarios: scenarios.iter().map(ScenarioRecord::from).collect(),
        }
    }

    pub fn to_pretty_json(&self) -> String {
        // Strings, options and finite numbers only; serialization cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

impl From<&Scenario> for ScenarioRecord {
    fn from(scenario: &Scenario) -> Self {
        Self {
            name: scenario.name.clone(),
            description: scenario.description.clone(),
            scenario_type: Some(scenario.scenario_type.as_str().to_string()),
            probability: scenario.probability,
            shocks: scenario
                .shocks
                .iter()
                .map(|shock| ShockRecord {
                    factor_type: shock.factor_type.clone(),
                    factor_id: shock.factor_id.clone(),
                    shock_type: shock.shock_type.clone(),
                    value: shock.value,
                    description: shock.description.clone(),
                })
                .collect(),
        }
    }
}

impl ScenarioRecord {
    fn into_scenario(self, index: usize, strict: bool) -> Result<Scenario, ParseError> {
        if strict {
            if self.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
                return Err(ParseError::RejectedRecord {
                    message: format!("scenario {} has no name", index),
                });
            }
            if self.description.as_deref().map_or(true, |d| d.trim().is_empty()) {
                return Err(ParseError::RejectedRecord {
                    message: format!("scenario {} has no description", index),
                });
            }
        }

        let mut unrecognized_type = None;
        let scenario_type = match self.scenario_type.as_deref().map(|t| t.trim().to_ascii_lowercase()) {
            None => ScenarioType::Stress,
            Some(tag) if tag == "stress" => ScenarioType::Stress,
            Some(tag) if tag == "stochastic" => ScenarioType::Stochastic,
            Some(other) if strict => {
                return Err(ParseError::RejectedRecord {
                    message: format!("scenario {} has unknown scenario_type '{}'", index, other),
                })
            }
            Some(_) => {
                let tag = self.scenario_type.unwrap_or_default();
                tracing::warn!(scenario = index, scenario_type = %tag, "unknown scenario_type, defaulting to stress");
                unrecognized_type = Some(tag);
                ScenarioType::Stress
            }
        };

        Ok(Scenario {
            name: self.name,
            description: self.description,
            scenario_type,
            probability: self.probability,
            shocks: self
                .shocks
                .into_iter()
                .map(|shock| Shock {
                    factor_type: shock.factor_type,
                    factor_id: shock.factor_id,
                    shock_type: shock.shock_type,
                    value: shock.value,
                    description: shock.description,
                })
                .collect(),
            unrecognized_type,
        })
    }
}

/// Interpreter settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpreterOptions {
    /// Reject scenarios without a name or description
    #[serde(default)]
    pub strict: bool,
}

/// Outcome of the textual repairs applied before parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repaired {
    pub text: String,
    pub comments_removed: usize,
    pub trailing_commas_removed: usize,
}

/// Turns raw backend text into scenarios.
///
/// Interpretation is all or nothing and keeps the source order of scenarios
/// and shocks.
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    options: InterpreterOptions,
}

impl Interpreter {
    pub fn new(options: InterpreterOptions) -> Self {
        Self { options }
    }

    pub fn strict() -> Self {
        Self::new(InterpreterOptions { strict: true })
    }

    pub fn options(&self) -> InterpreterOptions {
        self.options
    }

    pub fn interpret(&self, text: &str) -> SgResult<Vec<Scenario>> {
        let payload = extract_payload(text)?;
        let repaired = repair(payload);
        if repaired.comments_removed + repaired.trailing_commas_removed > 0 {
            tracing::debug!(
                comments = repaired.comments_removed,
                trailing_commas = repaired.trailing_commas_removed,
                "repaired backend payload"
            );
        }

        let payload: ScenarioPayload = serde_json::from_str(&repaired.text).map_err(ParseError::from)?;

        let scenarios = payload
            .scenarios
            .into_iter()
            .enumerate()
            .map(|(index, record)| record.into_scenario(index, self.options.strict))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            scenarios = scenarios.len(),
            shocks = scenarios.iter().map(|s| s.shocks.len()).sum::<usize>(),
            "interpreted backend response"
        );
        Ok(scenarios)
    }
}

/// Slice from the first `{` to the last `}` inclusive.
pub fn extract_payload(text: &str) -> Result<&str, ParseError> {
    let start = text.find('{').ok_or(ParseError::NoPayload)?;
    let end = text.rfind('}').ok_or(ParseError::NoPayload)?;
    if end < start {
        return Err(ParseError::NoPayload);
    }
    Ok(&text[start..=end])
}

/// Strip `//` and `#` line comments, then trailing commas before `}` or `]`.
/// Text inside string literals is never touched.
pub fn repair(text: &str) -> Repaired {
    let (text, comments_removed) = strip_line_comments(text);
    let (text, trailing_commas_removed) = strip_trailing_commas(&text);
    Repaired {
        text,
        comments_removed,
        trailing_commas_removed,
    }
}

/// Tracks whether a scanner is inside a JSON string literal.
#[derive(Default)]
struct StringState {
    in_string: bool,
    escaped: bool,
}

impl StringState {
    /// Feed one character; returns true if it belongs to a string literal
    /// (including the quotes).
    fn feed(&mut self, ch: char) -> bool {
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if ch == '\\' {
                self.escaped = true;
            } else if ch == '"' {
                self.in_string = false;
            }
            true
        } else if ch == '"' {
            self.in_string = true;
            true
        } else {
            false
        }
    }
}

fn strip_line_comments(text: &str) -> (String, usize) {
    let mut out = String::with_capacity(text.len());
    let mut state = StringState::default();
    let mut removed = 0;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if state.feed(ch) {
            out.push(ch);
            continue;
        }

        let starts_comment = ch == '#' || (ch == '/' && chars.peek() == Some(&'/'));
        if starts_comment {
            removed += 1;
            while let Some(&next) = chars.peek() {
                if next == '\n' {
                    break;
                }
                chars.next();
            }
        } else {
            out.push(ch);
        }
    }

    (out, removed)
}

fn strip_trailing_commas(text: &str) -> (String, usize) {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut state = StringState::default();
    let mut removed = 0;

    for (i, &ch) in chars.iter().enumerate() {
        if state.feed(ch) {
            out.push(ch);
            continue;
        }

        if ch == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                removed += 1;
                continue;
            }
        }
        out.push(ch);
    }

    (out, removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_types::{RiskFactorKind, SgError};

    const RATE_SHOCK: &str = r#"{"scenarios":[{"name":"Rate_Shock","description":"Parallel +200bps","scenario_type":"stress","shocks":[{"factor_type":"yield_curve","factor_id":"CHF_SWAP","shock_type":"parallel_shift_bps","value":200,"description":"up"}]}]}"#;

    #[test]
    fn test_rate_shock_payload() {
        let scenarios = Interpreter::default().interpret(RATE_SHOCK).unwrap();
        assert_eq!(scenarios.len(), 1);

        let scenario = &scenarios[0];
        assert_eq!(scenario.name.as_deref(), Some("Rate_Shock"));
        assert_eq!(scenario.description.as_deref(), Some("Parallel +200bps"));
        assert_eq!(scenario.scenario_type, ScenarioType::Stress);
        assert_eq!(scenario.shocks.len(), 1);

        let shock = &scenario.shocks[0];
        assert_eq!(shock.factor_type, FactorType::Known(RiskFactorKind::YieldCurve));
        assert_eq!(shock.factor_id, "CHF_SWAP");
        assert_eq!(shock.shock_type, ShockType::ParallelShiftBps);
        assert_eq!(shock.value, 200.0);
        assert_eq!(shock.description.as_deref(), Some("up"));
    }

    #[test]
    fn test_trailing_comma_repairs_identically() {
        let with_comma = RATE_SHOCK.replace("}]}]}", "}]}],}");
        assert_ne!(with_comma, RATE_SHOCK);

        let interpreter = Interpreter::default();
        assert_eq!(
            interpreter.interpret(&with_comma).unwrap(),
            interpreter.interpret(RATE_SHOCK).unwrap()
        );

        let nested = RATE_SHOCK.replace("\"up\"}", "\"up\",\n  }");
        assert_ne!(nested, RATE_SHOCK);
        assert_eq!(
            interpreter.interpret(&nested).unwrap(),
            interpreter.interpret(RATE_SHOCK).unwrap()
        );
    }

    #[test]
    fn test_no_payload() {
        for text in ["no json here", "", "only a closing } brace", "} backwards {"] {
            match Interpreter::default().interpret(text).unwrap_err() {
                SgError::Parse(ParseError::NoPayload) => (),
                other => panic!("Expected NoPayload for {text:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_surrounding_prose_ignored() {
        let text = format!("Here are your scenarios:\n```json\n{}\n```\nLet me know!", RATE_SHOCK);
        assert_eq!(Interpreter::default().interpret(&text).unwrap().len(), 1);
    }

    #[test]
    fn test_comments_stripped_outside_strings() {
        let text = r##"{
            // generated scenarios
            "scenarios": [{
                "name": "Swap // not a comment",
                "description": "Rates # also kept",  # trailing note
                "shocks": [
                    {"factor_type": "fx_rate", "factor_id": "EURCHF", "shock_type": "multiplicative", "value": 0.85, "description": "a, ]"},
                ]
            }]
        }"##;

        let scenarios = Interpreter::default().interpret(text).unwrap();
        assert_eq!(scenarios[0].name.as_deref(), Some("Swap // not a comment"));
        assert_eq!(scenarios[0].description.as_deref(), Some("Rates # also kept"));
        assert_eq!(scenarios[0].shocks[0].description.as_deref(), Some("a, ]"));
    }

    #[test]
    fn test_repair_counts_and_string_safety() {
        let repaired = repair(r#"{"a": "x,}", "b": [1, 2,], "c": "\"//,]",}"#);
        assert_eq!(repaired.text, r#"{"a": "x,}", "b": [1, 2], "c": "\"//,]"}"#);
        assert_eq!(repaired.trailing_commas_removed, 2);
        assert_eq!(repaired.comments_removed, 0);
    }

    #[test]
    fn test_invalid_structure_carries_position() {
        let err = Interpreter::default()
            .interpret("{\n  \"scenarios\": [\n    {\"name\": }\n  ]\n}")
            .unwrap_err();
        match err {
            SgError::Parse(ParseError::InvalidStructure { line, column, .. }) => {
                assert_eq!(line, 3);
                assert!(column > 0);
            }
            other => panic!("Expected InvalidStructure, got {other:?}"),
        }
    }

    #[test]
    fn test_value_must_be_number() {
        let text = RATE_SHOCK.replace("\"value\":200", "\"value\":\"200\"");
        assert!(Interpreter::default().interpret(&text).unwrap_err().is_parse());
    }

    #[test]
    fn test_lenient_defaults() {
        let text = r#"{"scenarios": [
            {"name": null, "description": null, "scenario_type": null},
            {"name": "Cut", "scenario_type": "Stochastic", "probability": 0.1, "shocks": null}
        ]}"#;
        let scenarios = Interpreter::default().interpret(text).unwrap();

        assert_eq!(scenarios.len(), 2);
        assert_eq!(scenarios[0].name, None);
        assert_eq!(scenarios[0].scenario_type, ScenarioType::Stress);
        assert!(scenarios[0].shocks.is_empty());
        assert_eq!(scenarios[1].scenario_type, ScenarioType::Stochastic);
        assert_eq!(scenarios[1].probability, Some(0.1));

        assert!(Interpreter::default().interpret("{}").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_tags_preserved() {
        let text = RATE_SHOCK
            .replace("\"yield_curve\"", "\"inflation_curve\"")
            .replace("\"parallel_shift_bps\"", "\"steepener\"");
        let shock = &Interpreter::default().interpret(&text).unwrap()[0].shocks[0];
        assert_eq!(shock.factor_type, FactorType::Other("inflation_curve".to_string()));
        assert_eq!(shock.shock_type, ShockType::Other("steepener".to_string()));
    }

    #[test]
    fn test_unknown_scenario_type_defaults_to_stress() {
        let text = r#"{"scenarios": [
            {"name": "A", "description": "kept", "scenario_type": "stress",
             "shocks": [{"factor_type": "yield_curve", "factor_id": "CHF_SWAP", "shock_type": "parallel_shift_bps", "value": 100}]},
            {"name": "B", "description": "mislabelled", "scenario_type": "stress_test", "shocks": []}
        ]}"#;

        let scenarios = Interpreter::default().interpret(text).unwrap();
        assert_eq!(scenarios.len(), 2);
        assert_eq!(scenarios[0].shocks.len(), 1);
        assert_eq!(scenarios[0].unrecognized_type, None);
        assert_eq!(scenarios[1].scenario_type, ScenarioType::Stress);
        assert_eq!(scenarios[1].unrecognized_type.as_deref(), Some("stress_test"));

        match Interpreter::strict().interpret(text).unwrap_err() {
            SgError::Parse(ParseError::RejectedRecord { message }) => assert!(message.contains("stress_test")),
            other => panic!("Expected RejectedRecord, got {other:?}"),
        }
    }

    #[test]
    fn test_strict_mode_requires_name_and_description() {
        let text = r#"{"scenarios": [{"name": "A", "description": "ok"}, {"name": "B", "description": null}]}"#;
        assert_eq!(Interpreter::default().interpret(text).unwrap().len(), 2);

        let err = Interpreter::strict().interpret(text).unwrap_err();
        assert!(err.is_parse());
        assert!(err.to_string().contains("scenario 1"));
    }

    #[test]
    fn test_order_preserved_and_idempotent() {
        let text = r#"{"scenarios": [
            {"name": "First", "shocks": [
                {"factor_type": "yield_curve", "factor_id": "B", "shock_type": "twist", "value": 1},
                {"factor_type": "yield_curve", "factor_id": "A", "shock_type": "twist", "value": 2}
            ]},
            {"name": "Second", "shocks": []},
            {"name": "Alpha", "shocks": []}
        ]}"#;
        let interpreter = Interpreter::default();
        let first = interpreter.interpret(text).unwrap();
        let second = interpreter.interpret(text).unwrap();
        assert_eq!(first, second);

        let names: Vec<&str> = first.iter().map(|s| s.display_name()).collect();
        assert_eq!(names, vec!["First", "Second", "Alpha"]);
        let ids: Vec<&str> = first[0].shocks.iter().map(|s| s.factor_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
    }

    #[test]
    fn test_no_partial_results() {
        let text = r#"{"scenarios": [
            {"name": "Good", "shocks": [{"factor_type": "fx_rate", "factor_id": "EURCHF", "shock_type": "multiplicative", "value": 0.9}]},
            {"name": "Bad", "shocks": [{"factor_type": "fx_rate", "factor_id": "EURCHF", "shock_type": "multiplicative"}]}
        ]}"#;
        assert!(Interpreter::default().interpret(text).unwrap_err().is_parse());
    }
}
