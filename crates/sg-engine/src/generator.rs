use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sg_data::UniverseCache;
use sg_llm::{build_backend, GenerativeBackend};
use sg_types::{validation_error, RiskUniverse, Scenario, SgResult};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::config::ScenGenConfig;
use crate::interpreter::{Interpreter, InterpreterOptions};
use crate::profiles::{BehaviorProfile, BuiltinProfiles};
use crate::projector::ScenarioTable;
use crate::prompt::{PromptBuilder, RequestedScenarioType};
use crate::summarizer::Summarizer;
use crate::validation::{ScenarioValidator, ValidationIssue, ValidationMode};

/// What a caller asks the pipeline for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRequest {
    pub instruction: String,
    pub num_scenarios: usize,
    pub scenario_type: RequestedScenarioType,
    pub profile: BehaviorProfile,
}

impl ScenarioRequest {
    pub fn new(instruction: &str) -> Self {
        Self {
            instruction: instruction.to_string(),
            num_scenarios: 3,
            scenario_type: RequestedScenarioType::Stress,
            profile: BehaviorProfile::default(),
        }
    }

    pub fn with_count(mut self, num_scenarios: usize) -> Self {
        self.num_scenarios = num_scenarios;
        self
    }

    pub fn with_type(mut self, scenario_type: RequestedScenarioType) -> Self {
        self.scenario_type = scenario_type;
        self
    }

    pub fn with_profile(mut self, profile: BehaviorProfile) -> Self {
        self.profile = profile;
        self
    }
}

/// Result of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub scenarios: Vec<Scenario>,
    pub table: ScenarioTable,
    /// Advisory findings; always empty in strict mode
    pub issues: Vec<ValidationIssue>,
}

/// Runs summarize, prompt, invoke, interpret, validate and project for one
/// request. Holds no per-request state.
#[derive(Debug, Clone)]
pub struct ScenarioGenerator {
    prompts: PromptBuilder,
    backend: Arc<dyn GenerativeBackend>,
    interpreter: Interpreter,
    validator: ScenarioValidator,
}

impl ScenarioGenerator {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self {
            prompts: PromptBuilder::default(),
            backend,
            interpreter: Interpreter::default(),
            validator: ScenarioValidator::default(),
        }
    }

    /// Generator wired from configuration, including the backend.
    pub fn from_config(config: &ScenGenConfig) -> SgResult<Self> {
        let backend = build_backend(&config.backend)?;
        Ok(Self::with_backend_and_config(backend, config))
    }

    pub fn with_backend_and_config(backend: Arc<dyn GenerativeBackend>, config: &ScenGenConfig) -> Self {
        let strict = config.validation.mode == ValidationMode::Strict;
        Self {
            prompts: PromptBuilder::new(Summarizer::new(config.summary.clone()), Arc::new(BuiltinProfiles)),
            backend,
            interpreter: Interpreter::new(InterpreterOptions { strict }),
            validator: ScenarioValidator::new(config.validation.clone()),
        }
    }

    pub fn with_prompt_builder(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_interpreter(mut self, interpreter: Interpreter) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn with_validator(mut self, validator: ScenarioValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn backend(&self) -> &dyn GenerativeBackend {
        self.backend.as_ref()
    }

    pub fn prompt_builder(&self) -> &PromptBuilder {
        &self.prompts
    }

    /// Generate scenarios for `universe`. Any failure aborts the whole run.
    pub async fn generate(&self, universe: &RiskUniverse, request: &ScenarioRequest) -> SgResult<GenerationOutcome> {
        if request.instruction.trim().is_empty() {
            return Err(validation_error!("instruction must not be empty"));
        }
        if request.num_scenarios == 0 {
            return Err(validation_error!("num_scenarios must be positive"));
        }

        let run_id = Uuid::new_v4();
        let started = Instant::now();
        tracing::info!(
            %run_id,
            backend = self.backend.name(),
            count = request.num_scenarios,
            scenario_type = %request.scenario_type,
            profile = %request.profile,
            "generating scenarios"
        );

        let prompt = self.prompts.build(
            &universe.risk_factors,
            &universe.counterparties,
            &universe.contracts,
            &request.instruction,
            request.num_scenarios,
            request.scenario_type,
            &request.profile,
        );

        let response = self.backend.invoke(&prompt).await?;
        tracing::trace!(%run_id, response = %response, "raw backend response");

        let scenarios = self.interpreter.interpret(&response)?;
        if scenarios.len() != request.num_scenarios {
            tracing::info!(
                %run_id,
                requested = request.num_scenarios,
                received = scenarios.len(),
                "backend returned a different scenario count"
            );
        }

        let issues = self.validator.validate(&scenarios, universe);
        self.validator.enforce(&issues)?;

        let table = ScenarioTable::from_scenarios(&scenarios);
        tracing::info!(
            %run_id,
            scenarios = scenarios.len(),
            rows = table.len(),
            issues = issues.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scenario generation finished"
        );

        Ok(GenerationOutcome {
            run_id,
            generated_at: Utc::now(),
            scenarios,
            table,
            issues,
        })
    }

    /// Generate against the universe cached for `selector`. Never loads; a
    /// missing entry is `DataError::Unavailable`.
    pub async fn generate_cached(
        &self,
        cache: &UniverseCache,
        selector: Option<&str>,
        request: &ScenarioRequest,
    ) -> SgResult<GenerationOutcome> {
        let universe = cache.get(selector)?;
        self.generate(&universe, request).await
    }
}
