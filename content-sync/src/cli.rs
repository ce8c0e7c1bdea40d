//! This module implements the CLI interface for content-sync: command parsing,
//! configuration resolution, the console summary and the exit-code contract.
//!
//! All core logic (discovery, validation, orchestration, reporting) lives in the
//! [`content-sync-core`] crate. This module is strictly CLI glue.
//!
//! ## Exit codes
//! - `0`: every discovered file succeeded
//! - `1`: the run completed but one or more files failed
//! - `2`: configuration or fatal error; no file was processed (returned as `Err` from [`run`])
//! - `130`: a second Ctrl-C aborted the run before a report was printed
//!
//! [`content-sync-core`]: ../../content-sync-core/

use crate::load_config::{load_config, storage_config, FileConfig};
use crate::upload::SupabaseStorage;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use content_sync_core::synchronise::{check, synchronise_with_cancel};
use content_sync_core::SyncReport;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

/// CLI for content-sync: publish lesson and manifest JSON to Supabase Storage.
#[derive(Parser)]
#[clap(
    name = "content-sync",
    version,
    about = "Validate lesson/manifest JSON files and upload them to a Supabase Storage bucket"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate every content file and upload it to the configured bucket
    Sync {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        #[clap(flatten)]
        overrides: Overrides,
    },
    /// Validate every content file without uploading anything
    Check {
        /// Path to the YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
        #[clap(flatten)]
        overrides: Overrides,
    },
}

#[derive(Args, Debug, Default)]
pub struct Overrides {
    /// Directory holding the content tree (overrides `content_root`)
    #[clap(long)]
    pub content_root: Option<PathBuf>,
    /// Number of files processed at once (overrides `concurrency`)
    #[clap(long)]
    pub concurrency: Option<usize>,
    /// Print the report as JSON instead of the text summary
    #[clap(long)]
    pub json: bool,
}

impl Overrides {
    fn apply(&self, config: &mut FileConfig) {
        if let Some(root) = &self.content_root {
            config.content_root = root.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main().
///
/// `Ok` carries the exit code of a completed run; `Err` means the run never started.
pub async fn run(cli: Cli) -> Result<ExitCode> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Sync { config, overrides } => {
            let mut file_config = load_config(&config)?;
            overrides.apply(&mut file_config);
            let storage_config = storage_config(&file_config)?;
            let storage = SupabaseStorage::new(&storage_config)
                .map_err(|e| anyhow::anyhow!("Failed to construct storage client: {e}"))?;

            let cancel = CancellationToken::new();
            spawn_ctrl_c_handler(cancel.clone());

            tracing::info!(command = "sync", "Starting synchronisation process");
            let report = synchronise_with_cancel(&file_config.sync_config(), &storage, &cancel)
                .await
                .context("Synchronisation aborted")?;

            let public_url = storage.public_base_url();
            if overrides.json {
                print_json(&report, Some(&public_url))?;
            } else {
                print!("{}", render_summary("Upload Summary", &report, Some(&public_url)));
            }
            Ok(exit_code(&report))
        }
        Commands::Check { config, overrides } => {
            let mut file_config = match &config {
                Some(path) => load_config(path)?,
                None => FileConfig::default(),
            };
            overrides.apply(&mut file_config);

            tracing::info!(command = "check", "Starting validation");
            let report = check(&file_config.sync_config())
                .await
                .context("Validation aborted")?;

            if overrides.json {
                print_json(&report, None)?;
            } else {
                print!("{}", render_summary("Validation Summary", &report, None));
            }
            Ok(exit_code(&report))
        }
    }
}

/// Exit code used when a second interrupt aborts the process.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if escalate_interrupt(&cancel) {
                std::process::exit(INTERRUPTED_EXIT_CODE);
            }
        }
    });
}

/// First interrupt cancels the run; a later one returns `true` to force an exit.
fn escalate_interrupt(cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        tracing::error!("Second interrupt received; aborting in-flight uploads without a report");
        return true;
    }
    tracing::warn!("Interrupt received; finishing in-flight uploads and skipping the rest (press Ctrl-C again to abort)");
    cancel.cancel();
    false
}

pub fn exit_code(report: &SyncReport) -> ExitCode {
    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

/// Human-readable summary printed on stdout at the end of a run.
pub fn render_summary(title: &str, report: &SyncReport, public_url: Option<&str>) -> String {
    let mut out = String::new();
    out.push_str(&format!("Found {} content files\n\n", report.total));
    out.push_str(&format!("--- {title} ---\n"));
    out.push_str(&format!("Success: {}\n", report.succeeded));
    out.push_str(&format!("Failed: {}\n", report.failed));
    out.push_str(&format!("Total: {}\n", report.total));

    if report.failed > 0 {
        out.push_str("\nFailed files:\n");
        for result in report.failures() {
            out.push_str(&format!(
                "  {} [{}]: {}\n",
                result.key,
                result.outcome,
                result.message.as_deref().unwrap_or("")
            ));
        }
    }

    if let Some(url) = public_url {
        out.push_str(&format!("\nPublic URL base: {url}\n"));
    }
    out
}

fn print_json(report: &SyncReport, public_url: Option<&str>) -> Result<()> {
    let mut value = serde_json::to_value(report)?;
    if let (Some(url), Some(map)) = (public_url, value.as_object_mut()) {
        map.insert("public_url_base".to_string(), serde_json::Value::from(url));
    }
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
