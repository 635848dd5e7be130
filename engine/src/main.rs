// Tutor
// Main entry point for the tutor binary

use clap::Parser;
use tutor_engine::cli::{Cli, Command};
use tutor_engine::config::Config;
use tutor_engine::handlers::{
    handle_chat, handle_config, handle_history, handle_serve, OutputFormat,
};
use tutor_engine::secrets::load_dotenv;
use tutor_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // An explicit --log wins over config; otherwise wait for the config level
    if let Some(level) = &cli.log {
        init_telemetry_with_level(level);
    }

    // Load configuration (or use custom path if provided)
    let mut config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    if let Some(level) = &cli.log {
        config.core.log_level = level.clone();
    }

    // Only takes effect if RUST_LOG is unset and --log was not given
    init_telemetry_with_level(&config.core.log_level);

    // API keys may come from a .env file; the process environment wins
    load_dotenv();

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");
    tracing::info!("Tutor v{} ({} - {})", version, commit, timestamp);

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    match cli.command {
        Command::Serve { bind } => {
            tracing::info!("Starting server...");
            handle_serve(config, bind).await
        }

        Command::Chat => handle_chat(&config, format).await,

        Command::History { thread_id, limit } => {
            handle_history(&config, thread_id, limit, format).await
        }

        Command::Config => handle_config(&config, format),
    }
}
