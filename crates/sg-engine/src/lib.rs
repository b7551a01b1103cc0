// ScenGen scenario generation engine
// Risk summary -> prompt -> backend -> interpreter -> table

pub mod config;
pub mod generator;
pub mod interpreter;
pub mod profiles;
pub mod projector;
pub mod prompt;
pub mod service;
pub mod summarizer;
pub mod validation;

pub use config::{GenerationDefaults, ScenGenConfig, ServiceConfig};
pub use generator::{GenerationOutcome, ScenarioGenerator, ScenarioRequest};
pub use interpreter::{extract_payload, repair, Interpreter, InterpreterOptions, ScenarioPayload};
pub use profiles::{BehaviorProfile, BuiltinProfiles, ProfileInfo, ProfileStore, DEFAULT_PROFILE};
pub use projector::{ScenarioRow, ScenarioTable};
pub use prompt::{PromptBuilder, RequestedScenarioType};
pub use service::{status_for, ApiError, GenerateBody, GenerateResponse, ScenarioService};
pub use summarizer::{Summarizer, SummaryLimits};
pub use validation::{IssueKind, ScenarioValidator, ValidationConfig, ValidationIssue, ValidationMode};
