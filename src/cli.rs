//! Command-line interface parsing for the hirecache binary
//!
//! The binary is an operator tool over the report cache: inspect freshness,
//! load or refresh reports for a job posting, and clear entries.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;

use crate::cache::ReportKind;
use crate::config::Config;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// Job posting ids must not be empty or blank
    #[error("Invalid job post id: '{0}'. Job post ids must not be blank")]
    InvalidJobPostId(String),
}

/// hirecache - Inspect and manage cached hiring reports
#[derive(Parser, Debug)]
#[command(name = "hirecache")]
#[command(about = "Inspect, load, refresh and clear cached hiring reports")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding cached reports
    #[arg(long, global = true, value_name = "PATH")]
    pub cache_dir: Option<PathBuf>,

    /// Base URL of the report API
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show cache freshness for every report kind
    Status {
        #[arg(value_parser = parse_job_post_id)]
        job_post_id: String,

        /// Print the status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load the final report, cache first
    Load {
        #[arg(value_parser = parse_job_post_id)]
        job_post_id: String,

        /// Fetch absent or expired base reports instead of listing them
        #[arg(long)]
        force: bool,
    },

    /// Refetch reports, bypassing the cache
    Refresh {
        target: Target,

        #[arg(value_parser = parse_job_post_id)]
        job_post_id: String,
    },

    /// Remove cached reports
    Clear {
        target: Target,

        #[arg(value_parser = parse_job_post_id)]
        job_post_id: String,
    },

    /// List cached entries
    List,
}

/// Which reports a refresh or clear applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    Document,
    Written,
    Interview,
    Final,
    All,
}

impl Target {
    /// The single kind targeted, or `None` for `all`
    pub fn kind(self) -> Option<ReportKind> {
        match self {
            Target::Document => Some(ReportKind::Document),
            Target::Written => Some(ReportKind::Written),
            Target::Interview => Some(ReportKind::Interview),
            Target::Final => Some(ReportKind::Final),
            Target::All => None,
        }
    }
}

/// Parses a job posting id argument, trimming surrounding whitespace
pub fn parse_job_post_id(s: &str) -> Result<String, CliError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(CliError::InvalidJobPostId(s.to_string()));
    }
    Ok(trimmed.to_string())
}

impl Cli {
    /// Applies command-line overrides on top of file configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(dir) = &self.cache_dir {
            config.cache.dir = Some(dir.clone());
        }
        if let Some(base_url) = &self.base_url {
            config.api.base_url = base_url.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_job_post_id_trims() {
        assert_eq!(parse_job_post_id(" 42 ").unwrap(), "42");
    }

    #[test]
    fn test_parse_job_post_id_rejects_blank() {
        let err = parse_job_post_id("   ").unwrap_err();
        assert!(err.to_string().contains("Invalid job post id"));
    }

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::parse_from(["hirecache", "status", "42"]);
        match cli.command {
            Command::Status { job_post_id, json } => {
                assert_eq!(job_post_id, "42");
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_load_force() {
        let cli = Cli::parse_from(["hirecache", "load", "7", "--force"]);
        assert!(matches!(
            cli.command,
            Command::Load { force: true, .. }
        ));
    }

    #[test]
    fn test_cli_parse_refresh_target() {
        let cli = Cli::parse_from(["hirecache", "refresh", "interview", "9"]);
        match cli.command {
            Command::Refresh { target, job_post_id } => {
                assert_eq!(target, Target::Interview);
                assert_eq!(target.kind(), Some(ReportKind::Interview));
                assert_eq!(job_post_id, "9");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_target() {
        assert!(Cli::try_parse_from(["hirecache", "clear", "summary", "9"]).is_err());
    }

    #[test]
    fn test_cli_rejects_blank_job_post_id() {
        assert!(Cli::try_parse_from(["hirecache", "status", ""]).is_err());
    }

    #[test]
    fn test_all_target_has_no_single_kind() {
        assert_eq!(Target::All.kind(), None);
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let cli = Cli::parse_from([
            "hirecache",
            "--cache-dir",
            "/tmp/reports",
            "--base-url",
            "http://example.test/api/v1",
            "--log-level",
            "debug",
            "list",
        ]);
        let mut config = Config::default();

        cli.apply_overrides(&mut config);

        assert_eq!(config.cache.dir, Some(PathBuf::from("/tmp/reports")));
        assert_eq!(config.api.base_url, "http://example.test/api/v1");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::parse_from(["hirecache", "status", "1", "--cache-dir", "/tmp/x"]);
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/x")));
    }
}
