//! Model backend settings shared by the CLI and the HTTP server.
//!
//! Every field can come from a flag or the environment; `.env` files are
//! loaded at startup so the environment route covers them too.

use crate::ai::client::{OpenAiClient, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::ai::provider::{LlmProvider, OfflineProvider, DEFAULT_MAX_TOKENS};
use crate::error::TrinityError;
use crate::orchestrator::Orchestrator;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug, Clone)]
pub struct ProviderSettings {
    /// Chat model used for every stage.
    #[arg(long, env = "TRINITY_MODEL", default_value = DEFAULT_MODEL, global = true)]
    pub model: String,

    /// Base URL of an OpenAI-compatible API.
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// API key; without one the offline fallback is used.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Token cap per completion.
    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS, global = true)]
    pub max_tokens: u32,

    /// Attempts per completion before giving up.
    #[arg(long, default_value_t = 3, global = true)]
    pub max_retries: u32,

    /// HTTP timeout per attempt, in seconds.
    #[arg(long, default_value_t = 60, global = true)]
    pub timeout_secs: u64,

    /// Write every model reply into this directory.
    #[arg(long, env = "TRINITY_DUMP_DIR", global = true)]
    pub dump_dir: Option<PathBuf>,

    /// Skip the network and use deterministic offline completions.
    #[arg(long, global = true)]
    pub offline: bool,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            max_retries: 3,
            timeout_secs: 60,
            dump_dir: None,
            offline: false,
        }
    }
}

impl ProviderSettings {
    pub fn build_provider(&self) -> Result<Arc<dyn LlmProvider>, TrinityError> {
        let api_key = self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty());

        match api_key {
            Some(key) if !self.offline => {
                let client = OpenAiClient::new(key, Duration::from_secs(self.timeout_secs))?
                    .with_base_url(&self.base_url)
                    .with_model(&self.model)
                    .with_max_retries(self.max_retries)
                    .with_dump_dir(self.dump_dir.clone());
                Ok(Arc::new(client))
            }
            _ => {
                if !self.offline {
                    log::warn!("No OPENAI_API_KEY configured, falling back to offline completions");
                }
                Ok(Arc::new(OfflineProvider))
            }
        }
    }

    pub fn build_orchestrator(&self) -> Result<Orchestrator, TrinityError> {
        Ok(Orchestrator::new(self.build_provider()?).with_max_tokens(self.max_tokens))
    }
}
