pub mod error;
pub mod ai {
    pub mod client;
    pub mod prompts;
    pub mod provider;
}
pub mod cli;
pub mod config;
pub mod orchestrator;
pub mod render;
pub mod server;

pub use error::TrinityError;
pub use orchestrator::{Orchestrator, TrinityRequest, TrinityResult};
