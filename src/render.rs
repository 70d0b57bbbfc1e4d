use crate::ai::prompts::Stage;
use crate::error::TrinityError;
use crate::orchestrator::TrinityResult;

pub const BANNER: &str = "🚀 Trinity Mind // Moonlander Mode";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn render(result: &TrinityResult, format: OutputFormat) -> Result<String, TrinityError> {
    match format {
        OutputFormat::Text => Ok(format_text(result)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
    }
}

pub fn format_text(result: &TrinityResult) -> String {
    let mut sections = vec![BANNER.to_string()];
    for stage in Stage::ALL {
        sections.push(String::new());
        sections.push(format!("[{}]", stage.title()));
        sections.push(result.get(stage).to_string());
    }
    sections.join("\n")
}
