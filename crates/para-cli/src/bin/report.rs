//! para-report: print analytics for a PARA vault snapshot as JSON.
//!
//! The snapshot is the host's JSON export of note metadata. Note bodies for
//! task extraction come from each note's inline `content` or, with
//! `--vault-root`, from the markdown files on disk.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use para_analytics::{build_report, extract_vault_tasks, AnalyticsConfig};
use para_cli::{load_snapshot, ConfigOverrides, SnapshotContent, VaultDir};
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "para-report")]
#[command(author, version, about = "PARA vault flow, pipeline, review, and task analytics")]
struct Cli {
    /// Vault snapshot JSON file
    #[arg(short, long)]
    snapshot: PathBuf,

    /// Vault directory used to read note bodies missing from the snapshot
    #[arg(long)]
    vault_root: Option<PathBuf>,

    /// Pipeline census window in days (overrides PARA_PIPELINE_WINDOW_DAYS)
    #[arg(short, long)]
    window_days: Option<u32>,

    /// Only count flows for notes created within this many days (0 = all)
    #[arg(long)]
    flow_window_days: Option<u32>,

    /// Local offset from UTC in minutes (overrides PARA_UTC_OFFSET_MINUTES)
    #[arg(long, allow_hyphen_values = true)]
    utc_offset_minutes: Option<i32>,

    /// Analysis instant as RFC 3339 (default: now)
    #[arg(long)]
    now: Option<DateTime<Utc>>,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON
    #[arg(long)]
    pretty: bool,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let _log_guard = init_logging();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Report failed");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let overrides = ConfigOverrides {
        pipeline_window_days: cli.window_days,
        flow_window_days: cli.flow_window_days,
        utc_offset_minutes: cli.utc_offset_minutes,
    };
    let config = overrides.apply(AnalyticsConfig::from_env())?;
    let now = cli.now.unwrap_or_else(Utc::now);

    let vault = match cli.vault_root {
        Some(root) => {
            let vault = VaultDir::open(&root)
                .with_context(|| format!("Cannot use vault root {}", root.display()))?;
            info!(vault_root = %vault.root().display(), "Reading note bodies from disk");
            Some(vault)
        }
        None => None,
    };

    let snapshot = load_snapshot(&cli.snapshot)?;
    let notes = snapshot.to_records(&config);
    let content = SnapshotContent::new(&snapshot, vault);
    let tasks = extract_vault_tasks(&content, &notes);

    let report = build_report(&notes, &tasks, &config, now);
    let json = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };

    match cli.output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write report {}", path.display()))?;
            info!(path = %path.display(), "Report written");
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// Install the tracing subscriber. Logs go to stderr (stdout carries the
/// report) or to a daily-rotated file when `LOG_FILE` is set.
///
/// Environment:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional)
///   LOG_ANSI    - "true"/"false" override ANSI colors
///   RUST_LOG    - standard env filter (default: "para_cli=info,para_analytics=warn,para_core=warn")
fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "para_cli=info,para_report=info,para_analytics=warn,para_core=warn".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("para-report.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    }
}
