//! biogate daemon: runs the verification engine behind a JSON-lines bridge.

mod bridge;
mod config;
mod lanes;

use anyhow::Context;
use biogate_profile::HttpProfileFetcher;
use biogate_types::SystemClock;
use biogate_utils::{format_duration, LogFormat};
use biogate_verification::VerificationOrchestrator;
use bridge::{Command, Output, StdioPlatform};
use clap::Parser;
use config::DaemonConfig;
use lanes::Lanes;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// How often audit events are flushed to stdout.
const EVENT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);
/// Throttle, lock and lane pruning runs every this many flushes.
const MAINTENANCE_EVERY: u64 = 60;

#[derive(Parser)]
#[command(name = "biogate-daemon", about = "Bio-code member verification daemon")]
struct Cli {
    /// Path to a TOML configuration file. CLI flags and env vars override it.
    #[arg(long, env = "BIOGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level or filter directive, e.g. "info" or "debug,biogate_profile=trace".
    #[arg(long, env = "BIOGATE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "BIOGATE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Read commands from stdin and write results to stdout until EOF.
    Run,
    /// Print the effective configuration as TOML and exit.
    PrintConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => DaemonConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => DaemonConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }

    match cli.command {
        CliCommand::PrintConfig => {
            print!("{}", config.to_toml_string());
            Ok(())
        }
        CliCommand::Run => {
            biogate_utils::init_logging(config.log_format, &config.log_level)
                .map_err(anyhow::Error::msg)?;
            run(config).await
        }
    }
}

async fn run(config: DaemonConfig) -> anyhow::Result<()> {
    let (out, rx) = mpsc::unbounded_channel::<Output>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        bridge::write_lines(rx, &mut stdout).await
    });

    let platform = Arc::new(StdioPlatform::new(out.clone()));
    let fetcher = Arc::new(
        HttpProfileFetcher::new(config.fetch.clone()).context("building profile fetcher")?,
    );
    let engine = VerificationOrchestrator::new(
        config.engine.clone(),
        platform.clone(),
        fetcher,
        Arc::new(SystemClock),
    );
    tracing::info!(
        session_timeout = %format_duration(config.engine.session_timeout()),
        max_attempts = config.engine.max_attempts,
        fetch_timeout_secs = config.fetch.timeout_secs,
        "biogate daemon started, reading commands from stdin"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut lanes = Lanes::new(engine.clone(), platform.clone(), out.clone());
    let mut flush = tokio::time::interval(EVENT_FLUSH_INTERVAL);
    let mut ticks: u64 = 0;

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<Command>(line) {
                        Ok(command) => {
                            tracing::debug!(command = command.name(), "command received");
                            lanes.submit(command);
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "ignoring malformed command line");
                            bridge::send(&out, Output::Error { command: None, message: e.to_string() });
                        }
                    }
                }
                Ok(None) => {
                    tracing::info!("stdin closed, shutting down");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to read stdin, shutting down");
                    break;
                }
            },
            _ = flush.tick() => {
                bridge::flush_events(&engine, &out);
                lanes.reap();
                ticks += 1;
                if ticks % MAINTENANCE_EVERY == 0 {
                    engine.maintenance().await;
                    lanes.prune_idle();
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupt received, shutting down");
                break;
            }
        }
    }

    // Let commands already accepted finish before the engine goes away.
    lanes.shutdown().await;
    bridge::flush_events(&engine, &out);

    // Dropping the engine aborts pending expiry timers and releases the
    // platform's sender; the writer ends once the last sender is gone.
    drop(engine);
    drop(platform);
    drop(out);
    writer.await??;

    tracing::info!("biogate daemon exited cleanly");
    Ok(())
}
