//! Command-line surface: a one-shot Moonlander run by default, `serve` for the API.

use crate::ai::provider::DEFAULT_TEMPERATURE;
use crate::config::ProviderSettings;
use crate::error::TrinityError;
use crate::orchestrator::{TrinityRequest, DEFAULT_CONSTRAINTS, DEFAULT_GOAL};
use crate::render::{self, OutputFormat};
use crate::server::{self, AppState};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::net::{IpAddr, SocketAddr};

const BOOT_LINE: &str = "Boot Trinity Mind // Moonlander Mode";

#[derive(Parser, Debug)]
#[command(name = "trinity")]
#[command(about = "Boot Trinity Mind // Moonlander Mode")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub run: RunArgs,

    #[command(flatten)]
    pub provider: ProviderSettings,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the reasoning loop over HTTP.
    Serve(ServeArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// Topic the engine should explore. Prompted for when omitted.
    #[arg(long)]
    pub topic: Option<String>,

    /// Desired outcome.
    #[arg(long, default_value = DEFAULT_GOAL)]
    pub goal: String,

    /// Any constraints that should steer the reasoning.
    #[arg(long, default_value = DEFAULT_CONSTRAINTS)]
    pub constraints: String,

    /// Sampling temperature for the LLM backend.
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f64,

    /// Choose between rich text or JSON output.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, env = "TRINITY_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    #[arg(long, env = "TRINITY_PORT", default_value_t = 8000)]
    pub port: u16,
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}

pub async fn run_with_cli(cli: Cli) -> Result<(), TrinityError> {
    match cli.command {
        Some(Commands::Serve(args)) => {
            let orchestrator = cli.provider.build_orchestrator()?;
            log::info!("Serving with provider '{}'", orchestrator.provider_name());
            server::serve(SocketAddr::new(args.host, args.port), AppState::new(orchestrator)).await
        }
        None => run_once(cli.run, &cli.provider).await,
    }
}

async fn run_once(args: RunArgs, provider: &ProviderSettings) -> Result<(), TrinityError> {
    let topic = match args.topic {
        Some(topic) => topic,
        None => {
            let stdin = io::stdin();
            prompt_topic(&mut stdin.lock(), &mut io::stdout())?
        }
    };

    let request = TrinityRequest::new(topic)
        .with_goal(args.goal)
        .with_constraints(args.constraints);

    let orchestrator = provider.build_orchestrator()?;
    let result = orchestrator.run(&request, args.temperature).await?;
    println!("{}", render::render(&result, args.format)?);
    Ok(())
}

/// Line printed to stderr when a CLI run fails.
pub fn failure_message(err: &TrinityError) -> String {
    format!("❌ {err}")
}

/// Interactive fallback when `--topic` is absent.
pub fn prompt_topic<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<String, TrinityError> {
    writeln!(output, "{BOOT_LINE}")?;
    write!(output, "Topic> ")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(TrinityError::InvalidInput("No topic supplied".into()));
    }

    let topic = line.trim();
    if topic.is_empty() {
        return Err(TrinityError::InvalidInput(
            "Topic is required to boot Moonlander Mode".into(),
        ));
    }
    Ok(topic.to_string())
}
