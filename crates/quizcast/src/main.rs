//! quizcast command-line entry point.

mod capture;
mod cli;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

use quizcast_adapter_tiktok::TikTokAdapter;
use quizcast_core::{SourceError, clean_target};
use quizcast_runtime::config::validate_config;
use quizcast_runtime::{QuizRuntime, QuizcastConfig, RuntimeError, build_source, logging};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::from(2);
        }
    };

    let result = match cli.command.unwrap_or_default() {
        Commands::Run {
            username,
            auto_start,
        } => run(config, username, auto_start).await,
        Commands::Capture {
            username,
            count,
            output,
        } => capture(config, &username, count, output).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "quizcast stopped");
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

fn load(cli: &Cli) -> Result<QuizcastConfig> {
    let mut builder = QuizRuntime::builder();
    if let Some(path) = &cli.config {
        builder = builder.config_file(path);
    }
    if let Some(profile) = &cli.profile {
        builder = builder.profile(profile);
    }
    builder.load().context("Failed to load configuration")
}

async fn run(mut config: QuizcastConfig, username: Option<String>, auto_start: bool) -> Result<()> {
    if let Some(username) = username {
        config.session.target = Some(clean_target(&username));
        config.session.auto_start = true;
    }
    if auto_start {
        config.session.auto_start = true;
    }
    validate_config(&config)?;

    let mut runtime = QuizRuntime::from_config(&config);
    runtime.register_source::<TikTokAdapter>()?;
    runtime.run().await?;
    Ok(())
}

async fn capture(
    config: QuizcastConfig,
    username: &str,
    count: usize,
    output: Option<std::path::PathBuf>,
) -> Result<()> {
    logging::init_from_config(&config.logging);

    let adapter: TikTokAdapter = build_source(&config)?;
    let target = clean_target(username);
    let stop = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    let report =
        capture::capture_comments(&adapter, adapter.config().user_schema, &target, count, stop)
            .await?;
    let path = output.unwrap_or_else(|| capture::default_output(&target));
    capture::write_report(&report, &path).await
}

/// 1 for failures the operator fixes by changing the target, 2 otherwise.
fn exit_code(error: &anyhow::Error) -> u8 {
    let user_correctable = error.chain().any(|cause| {
        cause
            .downcast_ref::<RuntimeError>()
            .is_some_and(RuntimeError::is_user_correctable)
            || cause
                .downcast_ref::<SourceError>()
                .is_some_and(SourceError::is_user_correctable)
    });
    if user_correctable { 1 } else { 2 }
}
