use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::Utc;
use colored::Colorize;
use tws_store::{DirPackageStore, DownloadStatusStore, FileMetadataStore, MetadataStore};
use tws_sync::{DownloadOrchestrator, DownloadReadiness, HttpTransport, SyncConfig};
use tws_types::{CheckinWindow, PackageId, Region};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = SyncConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    match cli.command {
        Command::Sync(args) => cmd_sync(&config, args).await,
        Command::Status(args) => cmd_status(&config, args),
        Command::Checkin(args) => cmd_checkin(&config, args),
    }
}

fn regions(config: &SyncConfig, requested: &[String]) -> anyhow::Result<Vec<Region>> {
    if requested.is_empty() {
        return Ok(config.regions.clone());
    }
    requested
        .iter()
        .map(|code| Region::new(code).with_context(|| format!("invalid region {code:?}")))
        .collect()
}

fn open_metadata(config: &SyncConfig) -> anyhow::Result<Arc<FileMetadataStore>> {
    let store = FileMetadataStore::open(&config.state_dir)
        .with_context(|| format!("opening state in {}", config.state_dir.display()))?;
    Ok(Arc::new(store))
}

async fn cmd_sync(config: &SyncConfig, args: SyncArgs) -> anyhow::Result<()> {
    config.validate()?;
    let regions = regions(config, &args.regions)?;
    let metadata = open_metadata(config)?;
    let readiness = DownloadReadiness::new(metadata.clone(), metadata.clone());
    let transport = HttpTransport::new(&config.base_url, config.request_timeout())?;
    let orchestrator = Arc::new(
        DownloadOrchestrator::new(
            Arc::new(transport),
            metadata.clone(),
            Arc::new(DirPackageStore::new(config.packages_dir())),
            Arc::new(config.verifier()?),
        )
        .with_revocations(Arc::new(config.revocations())),
    );

    let mut failed = 0;
    for region in &regions {
        if !args.force && !readiness.should_start_download(region) {
            println!(
                "{} {}: current hour already downloaded",
                "·".dimmed(),
                region.as_str().bold()
            );
            continue;
        }
        let outcome = orchestrator.start_download(region).await;
        metadata.set_last_run_successful(region, outcome.is_success())?;
        if outcome.is_success() {
            println!(
                "{} {}: {}",
                "✓".green().bold(),
                region.as_str().bold(),
                outcome.code().green()
            );
        } else {
            failed += 1;
            println!(
                "{} {}: {} ({})",
                "✗".red().bold(),
                region.as_str().bold(),
                outcome.code().red(),
                outcome
            );
        }
    }
    if failed > 0 {
        bail!("{failed} of {} region(s) failed to sync", regions.len());
    }
    Ok(())
}

fn cmd_status(config: &SyncConfig, args: StatusArgs) -> anyhow::Result<()> {
    let metadata = open_metadata(config)?;
    let readiness = DownloadReadiness::new(metadata.clone(), metadata.clone());
    for region in regions(config, &args.regions)? {
        let records = metadata.all(&region)?;
        let last_run = if metadata.was_last_run_successful(&region)? {
            "succeeded".green()
        } else {
            "failed or never run".yellow()
        };
        println!("{}", region.as_str().bold());
        println!("  Cached packages: {}", records.len().to_string().bold());
        if let (Some(first), Some(last)) = (records.first(), records.last()) {
            let latest_start = last.id.start().to_rfc3339();
            println!("  Range: {} .. {} ({})", first.id, last.id, latest_start.dimmed());
        }
        println!("  Last run: {last_run}");
        let due = if readiness.should_start_download(&region) {
            "yes".yellow()
        } else {
            "no".green()
        };
        println!("  Download due: {due}");
    }
    Ok(())
}

fn cmd_checkin(config: &SyncConfig, args: CheckinArgs) -> anyhow::Result<()> {
    let metadata = open_metadata(config)?;
    match args.action {
        CheckinAction::Add { start, end } => {
            let window = CheckinWindow::new(start, end.unwrap_or_else(Utc::now))?;
            metadata.insert_window(&window)?;
            println!(
                "{} Added check-in {} (from package {})",
                "✓".green().bold(),
                window.id.to_string().cyan(),
                window.start_package(),
            );
        }
        CheckinAction::List => {
            let windows = metadata.relevant_windows()?;
            if windows.is_empty() {
                println!("No check-ins recorded.");
            }
            for window in windows {
                println!(
                    "{}  {} .. {}  package {}",
                    window.id.to_string().cyan(),
                    window.start.to_rfc3339(),
                    window.end.to_rfc3339(),
                    PackageId::from_datetime(&window.start),
                );
            }
        }
        CheckinAction::Remove { id } => {
            if metadata.remove_window(&id)? {
                println!("Removed check-in {}", id.to_string().cyan());
            } else {
                bail!("no check-in with id {id}");
            }
        }
    }
    Ok(())
}
