use async_trait::async_trait;
use parking_lot::Mutex;
use sg_types::SgResult;
use std::collections::VecDeque;

use crate::config::BackendProtocol;
use crate::GenerativeBackend;

/// Three stress scenarios written against the sample universe.
pub const DEMO_RESPONSE: &str = r#"{
  "scenarios": [
    {
      "name": "Severe_Rate_Shock_2008_Style",
      "description": "Parallel +250 bps shift in all yield curves similar to the 2008 financial crisis, with credit spreads widening and equity markets declining sharply",
      "scenario_type": "stress",
      "shocks": [
        {"factor_type": "yield_curve", "factor_id": "CHF_SWAP", "shock_type": "parallel_shift_bps", "value": 250, "description": "Sharp rate increase"},
        {"factor_type": "yield_curve", "factor_id": "EUR_SWAP", "shock_type": "parallel_shift_bps", "value": 250, "description": "Parallel EUR rate shock"},
        {"factor_type": "spread_curve", "factor_id": "CHF_CORP_BBB", "shock_type": "parallel_shift_bps", "value": 200, "description": "BBB credit spread widening"},
        {"factor_type": "spread_curve", "factor_id": "CHF_CORP_A", "shock_type": "parallel_shift_bps", "value": 150, "description": "A-rated credit spread widening"},
        {"factor_type": "equity_index", "factor_id": "SMI", "shock_type": "multiplicative", "value": 0.70, "description": "30% equity market decline"},
        {"factor_type": "fx_rate", "factor_id": "EURCHF", "shock_type": "multiplicative", "value": 1.15, "description": "EUR strengthens on safe haven flows"}
      ]
    },
    {
      "name": "Moderate_Recession_Scenario",
      "description": "Moderate recession with rising unemployment, contracting GDP, modest rate cuts and moderate credit deterioration",
      "scenario_type": "stress",
      "shocks": [
        {"factor_type": "macro_factor", "factor_id": "CH_GDP_GROWTH", "shock_type": "absolute_change", "value": -2.5, "description": "GDP contraction of 2.5%"},
        {"factor_type": "macro_factor", "factor_id": "CH_UNEMPLOYMENT", "shock_type": "absolute_change", "value": 2.0, "description": "Unemployment up 2 percentage points"},
        {"factor_type": "yield_curve", "factor_id": "CHF_SWAP", "shock_type": "parallel_shift_bps", "value": -100, "description": "Rate cuts to support the economy"},
        {"factor_type": "spread_curve", "factor_id": "CHF_CORP_BBB", "shock_type": "parallel_shift_bps", "value": 100, "description": "Moderate credit spread widening"},
        {"factor_type": "equity_index", "factor_id": "SMI", "shock_type": "multiplicative", "value": 0.85, "description": "15% equity decline"}
      ]
    },
    {
      "name": "Currency_Crisis_CHF_Appreciation",
      "description": "Sudden CHF appreciation similar to the 2015 removal of the EUR/CHF floor",
      "scenario_type": "stress",
      "shocks": [
        {"factor_type": "fx_rate", "factor_id": "EURCHF", "shock_type": "multiplicative", "value": 0.85, "description": "EUR/CHF drops 15%"},
        {"factor_type": "fx_rate", "factor_id": "USDCHF", "shock_type": "multiplicative", "value": 0.80, "description": "USD/CHF drops 20%"},
        {"factor_type": "equity_index", "factor_id": "SMI", "shock_type": "multiplicative", "value": 0.90, "description": "Exporters sell off"},
        {"factor_type": "yield_curve", "factor_id": "CHF_SWAP", "shock_type": "parallel_shift_bps", "value": -50, "description": "Flight to CHF lowers rates"}
      ]
    }
  ]
}"#;

/// Prompts kept by a [`CannedBackend`] unless configured otherwise
pub const DEFAULT_PROMPT_HISTORY: usize = 8;

#[derive(Debug, Default)]
struct PromptLog {
    recent: VecDeque<String>,
    calls: usize,
}

/// Offline backend that answers every prompt with the same text.
///
/// The most recent prompts are kept so callers can inspect what would have
/// been sent; older ones are dropped.
#[derive(Debug)]
pub struct CannedBackend {
    response: String,
    history: usize,
    log: Mutex<PromptLog>,
}

impl CannedBackend {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            history: DEFAULT_PROMPT_HISTORY,
            log: Mutex::new(PromptLog::default()),
        }
    }

    pub fn demo() -> Self {
        Self::new(DEMO_RESPONSE)
    }

    /// Keep at most `history` prompts (0 keeps none).
    pub fn with_history(mut self, history: usize) -> Self {
        self.history = history;
        self
    }

    /// Retained prompts, oldest first
    pub fn prompts(&self) -> Vec<String> {
        self.log.lock().recent.iter().cloned().collect()
    }

    /// Every invocation, including those whose prompt was dropped
    pub fn call_count(&self) -> usize {
        self.log.lock().calls
    }
}

impl Default for CannedBackend {
    fn default() -> Self {
        Self::demo()
    }
}

#[async_trait]
impl GenerativeBackend for CannedBackend {
    async fn invoke(&self, prompt: &str) -> SgResult<String> {
        {
            let mut log = self.log.lock();
            log.calls += 1;
            if self.history > 0 {
                if log.recent.len() == self.history {
                    log.recent.pop_front();
                }
                log.recent.push_back(prompt.to_string());
            }
        }
        tracing::debug!(prompt_len = prompt.len(), "canned backend invoked");
        Ok(self.response.clone())
    }

    fn name(&self) -> &str {
        "canned"
    }

    fn protocol(&self) -> BackendProtocol {
        BackendProtocol::Canned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_payload_is_valid_json() {
        let value: serde_json::Value = serde_json::from_str(DEMO_RESPONSE).unwrap();
        let scenarios = value["scenarios"].as_array().unwrap();
        assert_eq!(scenarios.len(), 3);
        assert_eq!(scenarios[0]["shocks"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_records_prompts() {
        let backend = CannedBackend::new("{}");
        assert_eq!(backend.invoke("first").await.unwrap(), "{}");
        backend.invoke("second").await.unwrap();
        assert_eq!(backend.prompts(), vec!["first".to_string(), "second".to_string()]);
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_prompt_history_is_bounded() {
        let backend = CannedBackend::demo().with_history(3);
        for i in 0..10 {
            backend.invoke(&format!("prompt {i}")).await.unwrap();
        }
        assert_eq!(backend.prompts(), vec!["prompt 7", "prompt 8", "prompt 9"]);
        assert_eq!(backend.call_count(), 10);

        let default = CannedBackend::demo();
        for _ in 0..(DEFAULT_PROMPT_HISTORY * 4) {
            default.invoke("x".repeat(4096).as_str()).await.unwrap();
        }
        assert_eq!(default.prompts().len(), DEFAULT_PROMPT_HISTORY);

        let silent = CannedBackend::demo().with_history(0);
        silent.invoke("dropped").await.unwrap();
        assert!(silent.prompts().is_empty());
        assert_eq!(silent.call_count(), 1);
    }
}
