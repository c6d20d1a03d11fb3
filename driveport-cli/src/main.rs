//! # Driveport
//!
//! Command-line tool that extracts a cloud drive folder tree to local
//! disk ahead of a provider migration: resumable transfers, completeness
//! verification and a packaged backup archive.

mod cli;
mod config;
mod logging;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::error;

use cli::{Cli, Command};
use config::AppConfig;
use core_auth::FileCredentialStore;
use core_extract::{ExtractOutcome, ExtractPipeline};
use core_remote::time::{Clock, SystemClock, TokioSleeper};
use provider_drive::DriveClient;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {:#}", err);
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = logging::init(
        config.log.level.as_deref(),
        config.log.filter.as_deref(),
        config.log.format,
    ) {
        eprintln!("error: {:#}", err);
        return ExitCode::FAILURE;
    }

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = format!("{:#}", err), "Run failed");
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let credentials = FileCredentialStore::new(config.credentials_file.clone(), Arc::clone(&clock))
        .context("Could not initialize credential store")?;
    let source = DriveClient::new(Arc::new(credentials))
        .context("Could not initialize Drive client")?;

    match cli.command {
        Command::Extract(args) => {
            let pipeline = ExtractPipeline::new(
                Arc::new(source),
                clock,
                Arc::new(TokioSleeper),
                config.extract_config(args.strict_walk),
            );

            if args.structure_only {
                let outcome = pipeline.scaffold_only(&args.folder_id).await?;
                println!("Planned tasks: {}", outcome.planned);
                println!("Structure scaffolded, no transfers performed.");
            } else {
                let outcome = pipeline.run(&args.folder_id).await?;
                print_summary(&outcome);
            }
        }
        Command::Census(args) => {
            let pipeline = ExtractPipeline::new(
                Arc::new(source),
                clock,
                Arc::new(TokioSleeper),
                config.extract_config(false),
            );

            let census = pipeline.census(&args.folder_id).await?;
            println!("{}", census);
        }
    }

    Ok(())
}

fn print_summary(outcome: &ExtractOutcome) {
    println!("{:<13} {}", "Planned", outcome.planned);
    println!("{:<13} {}", "Transferred", outcome.transferred);
    println!("{:<13} {}", "Resumed", outcome.resumed);
    println!("{:<13} {}", "Skipped", outcome.skipped);
    println!("{:<13} {}", "Failed", outcome.failed);
    println!("{:<13} {}", "Ignored", outcome.ignored);
    if outcome.failed_folders > 0 {
        println!("{:<13} {}", "Unlisted", outcome.failed_folders);
    }

    if outcome.verified {
        match &outcome.backup_path {
            Some(path) => println!("Verified complete, backup at {}", path.display()),
            None => println!("Verified complete."),
        }
    } else {
        println!("Verification found {} missing file(s):", outcome.missing.len());
        for path in &outcome.missing {
            println!("  {}", path);
        }
    }
}
