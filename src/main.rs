//! Predikant CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use predikant::cli::{handle_error, Cli, Commands};
use predikant::infrastructure::config::ConfigLoader;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => return handle_error(&err),
    };

    let result = match cli.command {
        Commands::Generate(args) => {
            predikant::cli::commands::generate::execute(args, config).await
        }
        Commands::Stats => predikant::cli::commands::prompts::stats(config).await,
        Commands::Best(args) => predikant::cli::commands::prompts::best(config, args.full).await,
        Commands::History => predikant::cli::commands::prompts::history(config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => handle_error(&err),
    }
}
