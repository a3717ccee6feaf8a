use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::core::AppConfig;

pub mod chat;
pub mod render;

/// Chat with Gemini from the terminal. Conversations are saved to a
/// history file after every message.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Chat history file [env: ROOTGPT_HISTORY_FILE]
    #[arg(long)]
    history_file: Option<PathBuf>,

    /// Gemini model to chat with [env: ROOTGPT_MODEL]
    #[arg(long)]
    model: Option<String>,
}

impl Cli {
    /// Command line flags take precedence over the environment.
    pub fn apply(self, mut config: AppConfig) -> AppConfig {
        if let Some(path) = self.history_file {
            config.history_path = path;
        }
        if let Some(model) = self.model {
            config.gemini_model = model;
        }
        config
    }
}

// Logs go to stderr so they don't interleave with the transcript
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=warn", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

pub fn run() -> Result<()> {
    let args = Cli::parse();

    // Variables in .env are visible to everything below, including
    // RUST_LOG
    let dotenv_path = dotenv::dotenv().ok();
    init_tracing();
    if let Some(path) = dotenv_path {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let config = args.apply(AppConfig::default());
    chat::run(config)
}
