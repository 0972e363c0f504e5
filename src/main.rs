//! hirecache - Inspect and manage cached hiring reports
//!
//! Thin command-line front end over the report cache library.

use std::process::ExitCode;

use clap::Parser;

use hirecache::cache::{CacheStore, ExpiryPolicy, Invalidator, StatusInspector};
use hirecache::cli::{Cli, Command};
use hirecache::config::Config;
use hirecache::data::HttpReportApi;
use hirecache::loader::{LoadOutcome, ReportLoader, ReportOrigin};
use hirecache::logging::init_logging;

type BoxError = Box<dyn std::error::Error>;

/// Opens the configured cache store
fn open_store(config: &Config) -> Result<CacheStore, BoxError> {
    config
        .cache
        .store()
        .ok_or_else(|| "cannot determine a cache directory; pass --cache-dir".into())
}

fn build_loader(config: &Config) -> Result<ReportLoader<HttpReportApi>, BoxError> {
    let api = HttpReportApi::new(&config.api)?;
    Ok(ReportLoader::new(
        open_store(config)?,
        ExpiryPolicy::from_config(&config.cache),
        api,
    ))
}

/// Prints per-kind status lines followed by the summary
fn print_status(
    inspector: &StatusInspector,
    job_post_id: &str,
    json: bool,
) -> Result<(), BoxError> {
    let report = inspector.status(job_post_id);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Job post {}", job_post_id);
    for (kind, status) in report.iter() {
        let age = status
            .age_seconds
            .map(|s| format!("{}s", s))
            .unwrap_or_else(|| "-".to_string());
        let ttl = inspector.policy().ttl(kind).num_seconds();
        println!("  {:<10} {:<7} age {:>8}  ttl {}s", kind, status.label(), age, ttl);
    }
    println!("{}", report.summary());
    Ok(())
}

async fn run(command: Command, config: &Config) -> Result<(), BoxError> {
    match command {
        Command::Status { job_post_id, json } => {
            let inspector =
                StatusInspector::new(open_store(config)?, ExpiryPolicy::from_config(&config.cache));
            print_status(&inspector, &job_post_id, json)
        }
        Command::Load { job_post_id, force } => {
            let loader = build_loader(config)?;
            let outcome = if force {
                loader.force_load(&job_post_id).await
            } else {
                loader.load_all(&job_post_id).await
            };

            match outcome.map_err(|e| e.user_message())? {
                LoadOutcome::Ready { report, origin } => {
                    let origin = match origin {
                        ReportOrigin::Cached => "cached",
                        ReportOrigin::Assembled => "assembled",
                    };
                    eprintln!("Final report for job post {} ({})", job_post_id, origin);
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                outcome @ LoadOutcome::MissingReports(_) => {
                    println!("Missing reports for job post {}:", job_post_id);
                    for name in outcome.missing_report_names() {
                        println!("  - {}", name);
                    }
                    println!(
                        "Refresh them with `hirecache refresh <kind> {}` or rerun with --force.",
                        job_post_id
                    );
                }
            }
            Ok(())
        }
        Command::Refresh {
            target,
            job_post_id,
        } => {
            let loader = build_loader(config)?;
            match target.kind() {
                Some(kind) => {
                    loader
                        .refresh_kind(kind, &job_post_id)
                        .await
                        .map_err(|e| e.user_message())?;
                    println!("Refreshed {} for job post {}", kind.display_name(), job_post_id);
                }
                None => {
                    loader
                        .refresh_all(&job_post_id)
                        .await
                        .map_err(|e| e.user_message())?;
                    println!("Refreshed all reports for job post {}", job_post_id);
                }
            }
            println!("{}", loader.inspector().summary(&job_post_id));
            Ok(())
        }
        Command::Clear {
            target,
            job_post_id,
        } => {
            let invalidator = Invalidator::new(open_store(config)?);
            match target.kind() {
                Some(kind) => {
                    invalidator.clear(kind, &job_post_id)?;
                    println!("Cleared {} for job post {}", kind.display_name(), job_post_id);
                }
                None => {
                    invalidator.clear_all(&job_post_id)?;
                    println!("Cleared all reports for job post {}", job_post_id);
                }
            }
            Ok(())
        }
        Command::List => {
            let store = open_store(config)?;
            let keys = store.keys()?;
            if keys.is_empty() {
                println!("No cached reports in {}", store.dir().display());
            }
            for key in keys {
                println!("{:<12} {}", key.job_post_id(), key.kind());
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    cli.apply_overrides(&mut config);
    init_logging(&config.logging);

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
