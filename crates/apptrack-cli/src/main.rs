//! apptrack - third-party software update tracker

use std::process::ExitCode;

use clap::Parser;
use crossterm::style::Stylize;
use tracing_subscriber::EnvFilter;

use apptrack_cli::cmd;
use apptrack_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_path();
    let outcome = match cli.command {
        Commands::Pull => cmd::track::pull(config).await,
        Commands::Fetch => cmd::track::fetch(config).await,
        Commands::Approve { yes } => cmd::track::approve(config, yes).await,
        Commands::Make => cmd::track::make(config),
        Commands::Run => cmd::track::run(config).await,
        Commands::Check => cmd::check::check(config),
        Commands::Status => cmd::status::status(config),
        Commands::Hash { algorithm, files } => cmd::hash::hash(&files, algorithm).await,
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
