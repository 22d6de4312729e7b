//! Release Relay CLI entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration**: flags and environment variables via `clap`
//!    (see [`config`]).
//! 2. **Wire observability**: configure `tracing-subscriber` with a pretty or
//!    JSON layer, plus an OpenTelemetry OTLP exporter when
//!    `OTEL_EXPORTER_OTLP_ENDPOINT` is set. All `tracing` spans and structured
//!    events emitted by every crate in the workspace flow through this layer.
//! 3. **Construct infrastructure**: create the concrete `GithubClient` and
//!    inject it into the relay's router.
//! 4. **Run the selected command**:
//!    - `serve` binds the relay and runs until Ctrl-C.
//!    - `verify` checks a running relay with both client styles and exits
//!      non-zero on failure.

mod config;
mod observability;
mod verify;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use github::GithubClient;
use server::AppState;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::{Cli, Command, ServeArgs, VerifyArgs};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let telemetry = match observability::init(cli.log_format) {
        Ok(telemetry) => telemetry,
        Err(e) => {
            eprintln!("release-relay: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = match cli.command {
        Command::Serve(args) => run_serve(args).await,
        Command::Verify(args) => run_verify(args).await,
    };

    let code = match outcome {
        Ok(code) => code,
        Err(e) => {
            error!(error = %format!("{e:#}"), "release-relay failed");
            ExitCode::FAILURE
        }
    };

    telemetry.shutdown();
    code
}

async fn run_serve(args: ServeArgs) -> anyhow::Result<ExitCode> {
    let source =
        GithubClient::new(args.github_config()).context("failed to configure GitHub client")?;
    let state = AppState::new(Arc::new(source), args.repository.clone());

    let listener = TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;

    server::serve(listener, state, shutdown_signal()).await?;
    Ok(ExitCode::SUCCESS)
}

async fn run_verify(args: VerifyArgs) -> anyhow::Result<ExitCode> {
    let report = verify::run(&args).await?;
    println!("{}", report.render(args.output)?);

    if report.passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            // Without a signal handler the relay runs until killed.
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}
