//! charmwatch - daily report of new and updated charm store packages
//!
//! Fetches the charm store changes feed for a day, classifies the published
//! packages and writes `<prefix>-<date>.html` plus a `new.html` pointer.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};
use tracing_subscriber::EnvFilter;

use charmwatch_core::{Orchestrator, RunConfig, RunSummary};

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "charmwatch",
    about = "Report new and updated charm store packages for a day",
    version
)]
struct Cli {
    /// Report file prefix; the report is written to <PREFIX>-<DATE>.html
    prefix: String,

    /// Report date as YYYY-MM-DD (defaults to today)
    #[clap(long)]
    date: Option<NaiveDate>,

    /// Directory receiving the report and the new.html pointer
    #[clap(long, short)]
    output_dir: Option<PathBuf>,

    /// Charm store API root
    #[clap(long)]
    base_url: Option<String>,

    /// Cards per grid row
    #[clap(long)]
    row_width: Option<usize>,

    /// Per-request timeout in seconds
    #[clap(long)]
    timeout_secs: Option<u64>,

    /// Promulgation lookups in flight at once (1 = sequential)
    #[clap(long)]
    concurrency: Option<usize>,

    /// YAML configuration file
    #[clap(long)]
    config: Option<PathBuf>,

    /// Append-only log file
    #[clap(long, conflicts_with = "no_log_file")]
    log_file: Option<PathBuf>,

    /// Log to stderr only
    #[clap(long)]
    no_log_file: bool,

    /// Set log level [default: info, or `log_level` from the config file]
    #[clap(long)]
    log_level: Option<LogLevel>,

    /// Print the run summary as JSON
    #[clap(long)]
    json: bool,
}

impl Cli {
    /// Defaults, then the config file, then flags
    fn run_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => RunConfig::default(),
        };

        config.report.prefix = self.prefix.clone();

        if let Some(level) = &self.log_level {
            config.log_level = level.to_filter_directive().to_string();
        }

        if let Some(dir) = &self.output_dir {
            config.report.output_dir = dir.clone();
        }
        if let Some(url) = &self.base_url {
            config.catalog.base_url = url.clone();
        }
        if let Some(width) = self.row_width {
            config.report.row_width = width;
        }
        if let Some(timeout) = self.timeout_secs {
            config.catalog.timeout_seconds = timeout;
        }
        if let Some(concurrency) = self.concurrency {
            config.lookup_concurrency = concurrency;
        }
        if let Some(log_file) = &self.log_file {
            config.log_file = Some(log_file.clone());
        }
        if self.no_log_file {
            config.log_file = None;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

/// Stderr logging for everything outside a run; runs install their own sink
fn initialize_tracing(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Table row for the run summary
#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Category")]
    category: &'static str,
    #[tabled(rename = "Packages")]
    count: usize,
}

fn print_summary(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    let counts = &summary.counts;
    let rows = vec![
        SummaryRow {
            category: "New recommended",
            count: counts.new_promulgated,
        },
        SummaryRow {
            category: "New community",
            count: counts.new_community,
        },
        SummaryRow {
            category: "Updated recommended",
            count: counts.updated_promulgated,
        },
        SummaryRow {
            category: "Updated community",
            count: counts.updated_community,
        },
    ];

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string();

    println!("Report for {}: {}", summary.date, summary.report_path.display());
    println!("{table}");
    if summary.unknown_promulgation > 0 {
        println!(
            "{} package(s) with unknown promulgation status were listed as community",
            summary.unknown_promulgation
        );
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = cli.run_config()?;
    initialize_tracing(&config.log_level);

    let orchestrator = Orchestrator::new(config).context("Failed to set up report run")?;

    let result = match cli.date {
        Some(date) => orchestrator.run(date).await,
        None => orchestrator.run_today().await,
    };

    match result {
        Ok(summary) => print_summary(&summary, cli.json),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_positional_prefix_only() {
        let cli = Cli::try_parse_from(["charmwatch", "cs-whats-new"]).unwrap();
        assert_eq!(cli.prefix, "cs-whats-new");
        assert!(cli.date.is_none());

        let config = cli.run_config().unwrap();
        assert_eq!(config.report.prefix, "cs-whats-new");
        assert_eq!(config.report.row_width, 4);
    }

    #[test]
    fn test_cli_requires_prefix() {
        assert!(Cli::try_parse_from(["charmwatch"]).is_err());
    }

    #[test]
    fn test_cli_flags_override_config() {
        let cli = Cli::try_parse_from([
            "charmwatch",
            "report",
            "--date",
            "2016-08-05",
            "--base-url",
            "http://localhost:1234",
            "--row-width",
            "6",
            "--concurrency",
            "2",
            "--no-log-file",
        ])
        .unwrap();

        assert_eq!(cli.date, NaiveDate::from_ymd_opt(2016, 8, 5));
        let config = cli.run_config().unwrap();
        assert_eq!(config.catalog.base_url, "http://localhost:1234");
        assert_eq!(config.report.row_width, 6);
        assert_eq!(config.lookup_concurrency, 2);
        assert_eq!(config.log_file, None);
    }

    #[test]
    fn test_log_level_from_config_file_unless_flag_given() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("charmwatch.yaml");
        std::fs::write(&path, "log_level: debug\n").unwrap();
        let path = path.to_str().unwrap();

        let cli = Cli::try_parse_from(["charmwatch", "p", "--config", path]).unwrap();
        assert_eq!(cli.run_config().unwrap().log_level, "debug");

        let cli =
            Cli::try_parse_from(["charmwatch", "p", "--config", path, "--log-level", "warn"])
                .unwrap();
        assert_eq!(cli.run_config().unwrap().log_level, "warn");

        let cli = Cli::try_parse_from(["charmwatch", "p"]).unwrap();
        assert_eq!(cli.run_config().unwrap().log_level, "info");
    }

    #[test]
    fn test_cli_rejects_bad_date() {
        assert!(Cli::try_parse_from(["charmwatch", "p", "--date", "2016-13-40"]).is_err());
    }

    #[test]
    fn test_cli_rejects_zero_row_width() {
        let cli = Cli::try_parse_from(["charmwatch", "p", "--row-width", "0"]).unwrap();
        assert!(cli.run_config().is_err());
    }
}
