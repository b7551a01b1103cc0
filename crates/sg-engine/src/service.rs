//! HTTP front end for the generation pipeline.
//!
//! Routes: `GET /health`, `GET /status`, `POST /generate`.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sg_data::{DataManager, UniverseCache};
use sg_types::{Scenario, SgError, SgResult};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use uuid::Uuid;

use crate::config::ScenGenConfig;
use crate::generator::{ScenarioGenerator, ScenarioRequest};
use crate::profiles::BehaviorProfile;
use crate::projector::ScenarioRow;
use crate::prompt::RequestedScenarioType;
use crate::validation::ValidationIssue;

/// HTTP status for a pipeline failure
pub fn status_for(error: &SgError) -> StatusCode {
    match error {
        e if e.is_data_unavailable() => StatusCode::NOT_FOUND,
        SgError::Config(_) | SgError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        e if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
        SgError::Backend(_) | SgError::Parse(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Failure of one API request
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Pipeline(SgError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(e) => status_for(e),
        }
    }
}

impl From<SgError> for ApiError {
    fn from(err: SgError) -> Self {
        ApiError::Pipeline(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("invalid JSON body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::BadRequest(message) => message,
            ApiError::Pipeline(e) => {
                tracing::warn!(error = %e, %status, "generate request failed");
                e.to_string()
            }
        };
        (status, Json(json!({ "status": "error", "error": message }))).into_response()
    }
}

/// `POST /generate` body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateBody {
    #[serde(default)]
    pub instruction: Option<String>,
    #[serde(default)]
    pub num_scenarios: Option<usize>,
    #[serde(default)]
    pub scenario_type: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub selector: Option<String>,
}

/// `POST /generate` success payload
#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
    pub status: &'static str,
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub num_scenarios: usize,
    pub scenarios: Vec<Scenario>,
    pub rows: Vec<ScenarioRow>,
    pub issues: Vec<ValidationIssue>,
}

/// Shared state behind the router
#[derive(Debug)]
pub struct ScenarioService {
    config: ScenGenConfig,
    data: DataManager,
    generator: ScenarioGenerator,
    started: Instant,
}

impl ScenarioService {
    pub fn new(config: ScenGenConfig, data: DataManager, generator: ScenarioGenerator) -> Self {
        Self {
            config,
            data,
            generator,
            started: Instant::now(),
        }
    }

    /// Service wired entirely from configuration.
    pub fn from_config(config: ScenGenConfig) -> SgResult<Self> {
        let generator = ScenarioGenerator::from_config(&config)?;
        let mut data = DataManager::with_sources(&config.service.data_sources());
        data.cache = UniverseCache::with_limit(config.service.cache_entries);
        data.contract_limit = config.service.contract_limit;
        Ok(Self::new(config, data, generator))
    }

    pub fn data(&self) -> &DataManager {
        &self.data
    }

    /// Router over the three routes, sharing `self`.
    pub fn router(self: Arc<Self>) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/status", get(status_handler))
            .route("/generate", post(generate_handler))
            .fallback(not_found_handler)
            .with_state(self)
    }

    /// Serve on `listener` until it fails.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> SgResult<()> {
        let addr = listener.local_addr()?;
        tracing::info!(%addr, "scenario service accepting requests");
        axum::serve(listener, self.router()).await?;
        Ok(())
    }

    fn status_report(&self) -> serde_json::Value {
        let stats = self.data.cache.get_stats();
        json!({
            "status": "ok",
            "uptime_secs": self.started.elapsed().as_secs(),
            "backend": {
                "protocol": self.config.backend.protocol,
                "model": self.generator.backend().name(),
                "base_url": self.config.backend.base_url,
                "timeout_secs": self.config.backend.timeout_secs,
            },
            "generation": self.config.generation,
            "validation_mode": self.config.validation.mode,
            "profiles": self.generator.prompt_builder().profiles().list(),
            "providers": self.data.providers.iter().map(|p| p.config()).collect::<Vec<_>>(),
            "cache": {
                "hits": stats.hits,
                "misses": stats.misses,
                "hit_rate": stats.hit_rate(),
                "universes": self.data.cache.get_cache_info(),
            },
        })
    }

    /// Turn a request body into a pipeline request, applying defaults.
    fn scenario_request(&self, body: GenerateBody) -> Result<ScenarioRequest, ApiError> {
        let instruction = match body.instruction.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => return Err(ApiError::BadRequest("instruction is required".to_string())),
        };

        let defaults = &self.config.generation;
        let scenario_type = match body.scenario_type.as_deref() {
            None => defaults.scenario_type,
            Some(tag) => tag
                .parse::<RequestedScenarioType>()
                .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        };

        Ok(ScenarioRequest {
            instruction,
            num_scenarios: defaults.clamp_count(body.num_scenarios),
            scenario_type,
            profile: BehaviorProfile::Named(body.profile.unwrap_or_else(|| defaults.profile.clone())),
        })
    }

    /// Load (or reuse) the universe for `selector` and run the pipeline on
    /// that snapshot.
    pub async fn run(&self, selector: Option<&str>, request: &ScenarioRequest) -> SgResult<GenerateResponse> {
        let universe = self.data.load_universe(selector).await?;
        let outcome = self.generator.generate(&universe, request).await?;

        Ok(GenerateResponse {
            status: "success",
            run_id: outcome.run_id,
            generated_at: outcome.generated_at,
            num_scenarios: outcome.scenarios.len(),
            scenarios: outcome.scenarios,
            rows: outcome.table.rows,
            issues: outcome.issues,
        })
    }
}

async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": "scenario-generation" })),
    )
}

async fn status_handler(State(service): State<Arc<ScenarioService>>) -> impl IntoResponse {
    (StatusCode::OK, Json(service.status_report()))
}

async fn generate_handler(
    State(service): State<Arc<ScenarioService>>,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(body) = body?;
    let selector = body.selector.clone();
    let request = service.scenario_request(body)?;
    tracing::info!(selector = ?selector, count = request.num_scenarios, "generate request");

    let response = service.run(selector.as_deref(), &request).await?;
    Ok(Json(response))
}

async fn not_found_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "status": "error", "error": "no such route" })),
    )
}
