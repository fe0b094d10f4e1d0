//! Sync command - Mirror the account into the local cache
//!
//! Provides the `docmirror sync` CLI command which:
//! 1. Applies command-line overrides to the loaded configuration
//! 2. Validates it (a missing token fails here, before any request)
//! 3. Creates the remote and cache adapters
//! 4. Runs the SyncEngine with Ctrl-C wired to cancellation and reports

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use docmirror_cache::FileManifestStore;
use docmirror_core::config::Config;
use docmirror_core::domain::{EntityKind, SyncOutcome};
use docmirror_core::ports::{IManifestStore, IRemoteSource};
use docmirror_remote::YuqueRemoteSource;
use docmirror_sync::{SyncEngine, SyncOptions, SyncReport};

use crate::output::{duration, get_formatter, plural, OutputFormat, OutputFormatter};

#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Maximum remote fetches in flight (overrides sync.concurrency)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Skip a repository's documents when its own timestamp has not advanced
    #[arg(long)]
    pub trust_repository_timestamps: bool,

    /// Mirror this account instead of the token's own (overrides remote.user)
    #[arg(long)]
    pub user: Option<String>,
}

impl SyncCommand {
    /// Execute the sync command
    pub async fn execute(&self, mut config: Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        config.apply_env();
        self.apply_overrides(&mut config);

        let errors = config.validate();
        if !errors.is_empty() {
            for e in &errors {
                formatter.error(&e.to_string());
            }
            bail!("Invalid configuration ({})", plural(errors.len(), "error"));
        }

        let manifest_dir = config.manifest_dir();
        info!(
            host = %config.remote.host,
            manifest_dir = %manifest_dir.display(),
            "Loaded configuration"
        );

        let remote: Arc<dyn IRemoteSource> = Arc::new(
            YuqueRemoteSource::from_config(&config.remote)
                .context("Failed to create the API client")?,
        );
        let store: Arc<dyn IManifestStore> = Arc::new(FileManifestStore::new(&manifest_dir));
        let engine = SyncEngine::new(remote, store, SyncOptions::from_config(&config.sync));

        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, finishing in-flight requests");
                on_interrupt.cancel();
            }
        });

        formatter.info("Starting synchronization...");
        let report = engine
            .sync(config.remote.user.as_deref(), &cancel)
            .await
            .context("Synchronization failed")?;

        print_report(formatter.as_ref(), format, &report)?;

        if report.cancelled {
            bail!("Synchronization cancelled; run again to finish");
        }
        Ok(())
    }

    fn apply_overrides(&self, config: &mut Config) {
        if let Some(n) = self.concurrency {
            config.sync.concurrency = n;
        }
        if self.trust_repository_timestamps {
            config.sync.trust_repository_timestamps = true;
        }
        if let Some(user) = &self.user {
            config.remote.user = Some(user.clone());
        }
    }
}

fn print_report(
    formatter: &dyn OutputFormatter,
    format: OutputFormat,
    report: &SyncReport,
) -> Result<()> {
    if matches!(format, OutputFormat::Json) {
        let json = serde_json::to_value(report).context("Failed to serialize sync report")?;
        formatter.print_json(&json);
        return Ok(());
    }

    let account = report.login.as_deref().unwrap_or("<unknown>");
    if report.changes() == 0 && report.errors.is_empty() && !report.cancelled {
        formatter.success(&format!("{account} is already up to date"));
    } else {
        formatter.success(&format!(
            "Synchronized {account} in {}",
            duration(report.duration_ms)
        ));
    }

    for kind in [EntityKind::Repository, EntityKind::Document] {
        for outcome in [
            SyncOutcome::Created,
            SyncOutcome::Updated,
            SyncOutcome::Removed,
        ] {
            let paths = report.paths(kind, outcome);
            if !paths.is_empty() {
                formatter.info(&format!(
                    "{:<10} {}",
                    format!("{outcome}:"),
                    plural(paths.len(), &kind.to_string())
                ));
            }
        }
    }
    formatter.info(&format!("{:<10} {}", "unchanged:", report.unchanged));
    if report.skipped > 0 {
        formatter.info(&format!("{:<10} {}", "skipped:", report.skipped));
    }

    if !report.errors.is_empty() {
        formatter.error(&format!("{} occurred:", plural(report.errors.len(), "error")));
        for err in &report.errors {
            formatter.info(&format!("  - {}", err));
        }
    }
    if report.cancelled {
        formatter.warn("Run was cancelled; listings of unfinished levels were not written");
    }

    Ok(())
}
