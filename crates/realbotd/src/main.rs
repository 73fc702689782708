//! REALbot Daemon - real estate chat assistant
//!
//! Answers visitor questions from the knowledge base, falls back to the chat
//! completion API, and keeps lead qualification data per session.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use realbotd::config::{Config, LOCAL_CONFIG_PATH};
use realbotd::llm::OpenAiGenerator;
use realbotd::server::{self, AppState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

type LogHandle = reload::Handle<EnvFilter, Registry>;

#[derive(Parser)]
#[command(name = "realbotd")]
#[command(about = "REALbot - real estate chat assistant daemon", long_about = None)]
#[command(version)]
struct Cli {
    /// Subcommand (defaults to serve)
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Config file (defaults to /etc/realbot/config.toml, then ./realbot.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Write a config file holding the API key
    InitConfig {
        #[arg(long)]
        api_key: String,

        #[arg(long, default_value = LOCAL_CONFIG_PATH)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Install the subscriber before anything else logs. RUST_LOG wins when set;
/// otherwise the filter starts at `info` and can be swapped once the config
/// file has been read.
fn init_logging() -> Option<LogHandle> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
            None
        }
        Err(_) => {
            let (filter, handle) = reload::Layer::new(EnvFilter::new("info"));
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
            Some(handle)
        }
    }
}

fn apply_log_level(handle: Option<&LogHandle>, level: &str) {
    if let Some(handle) = handle {
        if let Err(e) = handle.reload(EnvFilter::new(level)) {
            warn!("Failed to apply log level {}: {}", level, e);
        }
    }
}

fn is_test_env() -> bool {
    std::env::var("REALBOT_ENV")
        .map(|v| v == "test")
        .unwrap_or(false)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve { config: None }) {
        Commands::Serve { config } => serve(config.as_deref()).await,
        Commands::InitConfig {
            api_key,
            path,
            force,
        } => init_config(&api_key, &path, force),
    }
}

async fn serve(config_path: Option<&Path>) -> Result<()> {
    let log_handle = init_logging();
    info!("REALbot Daemon v{} starting", realbot_shared::VERSION);

    let mut config = Config::load(config_path)?;
    config.apply_env_overrides(|key| std::env::var(key).ok());
    apply_log_level(log_handle.as_ref(), &config.logging.level);

    if let Err(e) = config.validate() {
        if is_test_env() {
            warn!("{} (REALBOT_ENV=test, continuing)", e);
        } else {
            bail!("{}. Set OPENAI_API_KEY or run `realbotd init-config`", e);
        }
    }

    info!("Data directory: {}", config.data.dir.display());
    info!(
        "Analytics: {}",
        if config.analytics.enabled { "enabled" } else { "disabled" }
    );

    let generator = Arc::new(OpenAiGenerator::new(config.openai.clone())?);
    let state = AppState::from_config(config, generator);
    info!(
        "Knowledge base ready ({} entries)",
        state.knowledge.entries().await.len()
    );

    tokio::select! {
        result = server::run(state) => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down gracefully"),
    }

    Ok(())
}

fn init_config(api_key: &str, path: &Path, force: bool) -> Result<()> {
    init_logging();

    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let mut config = Config::default();
    config.openai.api_key = Some(api_key.trim().to_string());
    config.validate()?;
    config.save(path)?;

    println!("Configuration written to {}", path.display());
    Ok(())
}
