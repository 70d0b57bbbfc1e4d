use crate::ai::prompts::{self, Stage};
use crate::ai::provider::{CompletionOptions, LlmProvider, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::error::TrinityError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub const DEFAULT_GOAL: &str = "clarity";
pub const DEFAULT_CONSTRAINTS: &str = "realistic";

const SYNTHESIS_COOLDOWN: f64 = 0.2;
const MAX_TEMPERATURE: f64 = 2.0;

fn default_goal() -> String {
    DEFAULT_GOAL.to_string()
}

fn default_constraints() -> String {
    DEFAULT_CONSTRAINTS.to_string()
}

/// Input for one Trinity reasoning pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrinityRequest {
    #[schemars(description = "Topic the engine should explore.")]
    pub topic: String,
    #[serde(default = "default_goal")]
    #[schemars(description = "Desired outcome.")]
    pub goal: String,
    #[serde(default = "default_constraints")]
    #[schemars(description = "Constraints that should steer the reasoning.")]
    pub constraints: String,
}

impl TrinityRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            goal: default_goal(),
            constraints: default_constraints(),
        }
    }

    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = goal.into();
        self
    }

    pub fn with_constraints(mut self, constraints: impl Into<String>) -> Self {
        self.constraints = constraints.into();
        self
    }
}

/// Output of the three stages, serialized in pipeline order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrinityResult {
    pub generate: String,
    pub oppose: String,
    pub synthesize: String,
}

impl TrinityResult {
    pub fn get(&self, stage: Stage) -> &str {
        match stage {
            Stage::Generate => &self.generate,
            Stage::Oppose => &self.oppose,
            Stage::Synthesize => &self.synthesize,
        }
    }
}

/// Runs Generate → Oppose → Synthesize against a single provider.
#[derive(Clone)]
pub struct Orchestrator {
    provider: Arc<dyn LlmProvider>,
    max_tokens: u32,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// One Moonlander Mode run at the default temperature.
    pub async fn boot_moonlander(&self, request: &TrinityRequest) -> Result<TrinityResult, TrinityError> {
        self.run(request, DEFAULT_TEMPERATURE).await
    }

    pub async fn run(&self, request: &TrinityRequest, temperature: f64) -> Result<TrinityResult, TrinityError> {
        validate(request, temperature)?;

        let run_id = Uuid::new_v4();
        log::info!("🧠 Trinity run {run_id} on '{}' via {}", request.topic, self.provider.name());

        log::info!("🧪 Phase 1: Generate");
        let generated = self
            .call(Stage::Generate, &prompts::generate_prompt(request), temperature)
            .await?;

        log::info!("⚔️  Phase 2: Oppose");
        let opposed = self
            .call(Stage::Oppose, &prompts::oppose_prompt(&generated), temperature)
            .await?;

        log::info!("🔗 Phase 3: Synthesize");
        let synthesis_temperature = (temperature - SYNTHESIS_COOLDOWN).max(0.0);
        let synthesized = self
            .call(Stage::Synthesize, &prompts::synthesize_prompt(&opposed), synthesis_temperature)
            .await?;

        log::info!("🎉 Trinity run {run_id} complete");
        Ok(TrinityResult {
            generate: generated,
            oppose: opposed,
            synthesize: synthesized,
        })
    }

    async fn call(&self, stage: Stage, prompt: &str, temperature: f64) -> Result<String, TrinityError> {
        let options = CompletionOptions::new(stage)
            .with_temperature(temperature)
            .with_max_tokens(self.max_tokens);

        let reply = self.provider.complete(prompt, &options).await.map_err(|e| {
            log::error!("   ❌ {stage} stage failed: {e}");
            e
        })?;
        log::info!("   -> {stage}: {} chars", reply.chars().count());
        Ok(reply)
    }
}

pub fn validate(request: &TrinityRequest, temperature: f64) -> Result<(), TrinityError> {
    if request.topic.trim().is_empty() {
        return Err(TrinityError::InvalidInput("topic must not be empty".into()));
    }
    if !temperature.is_finite() || !(0.0..=MAX_TEMPERATURE).contains(&temperature) {
        return Err(TrinityError::InvalidInput(format!(
            "temperature must be between 0.0 and {MAX_TEMPERATURE}, got {temperature}"
        )));
    }
    Ok(())
}
