// ABOUTME: Entry point for the slotswap CLI application.
// ABOUTME: Parses arguments, wires logging and cancellation, and maps outcomes to exit codes.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use slotswap::deploy::DeploymentOutcome;
use slotswap::error::Result;
use slotswap::output::Output;
use std::process::ExitCode;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbosity flags
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(cli.verbose)
        .with_writer(std::io::stderr)
        .init();

    let mode = cli.output_mode();
    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::warn!("shutdown signal received, stopping after the current step");
        cancel_on_signal.cancel();
    });

    match run(cli, cancel).await {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            Output::new(mode).error_chain(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, cancel: CancellationToken) -> Result<DeploymentOutcome> {
    let output = Output::new(cli.output_mode());
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Init { host, root, force } => {
            commands::init(host.as_deref(), root.as_deref(), force, output)?;
            Ok(DeploymentOutcome::Succeeded)
        }
        Commands::Deploy { source, target } => {
            let config = commands::load_config(config_path, target.destination.as_deref())?;
            commands::deploy(config, source, cancel, output).await
        }
        Commands::Rollback { target } => {
            let config = commands::load_config(config_path, target.destination.as_deref())?;
            commands::rollback(config, cancel, output).await
        }
        Commands::Status { target } => {
            let config = commands::load_config(config_path, target.destination.as_deref())?;
            commands::status(config, output).await?;
            Ok(DeploymentOutcome::Succeeded)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
