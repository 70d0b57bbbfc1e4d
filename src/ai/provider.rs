use super::prompts::Stage;
use crate::error::TrinityError;
use async_trait::async_trait;

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 800;

const OFFLINE_HEADER: &str = "[OFFLINE COMPLETION]";
const OFFLINE_PREVIEW_CHARS: usize = 200;

/// Per-call sampling parameters handed to a provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub stage: Stage,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl CompletionOptions {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Anything that can turn a prompt into a model completion.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String, TrinityError>;

    /// Short label for logs.
    fn name(&self) -> &str;
}

/// Deterministic stand-in used when no model backend is reachable.
#[derive(Debug, Default, Clone)]
pub struct OfflineProvider;

#[async_trait]
impl LlmProvider for OfflineProvider {
    async fn complete(&self, prompt: &str, _options: &CompletionOptions) -> Result<String, TrinityError> {
        let preview: String = prompt.chars().take(OFFLINE_PREVIEW_CHARS).collect();
        Ok(format!("{OFFLINE_HEADER}\nPrompt: {preview}"))
    }

    fn name(&self) -> &str {
        "offline"
    }
}
