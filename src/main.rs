// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::*;
use sharepoint_monitor::api::{self, AppState};
use sharepoint_monitor::utils::logging::{
    format_error, format_info, format_state, format_step, format_success, format_warning,
};
use sharepoint_monitor::{
    AnomalyDetector, ChangeKind, Config, CycleLogStore, CycleRunner, CycleScheduler, HealthCheck,
    HealthReport, HealthStatus, JsonExporter,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "sharepoint_monitor")]
#[command(author = "cipher")]
#[command(version = "0.1.0")]
#[command(about = "Monitors a SharePoint document library for new, modified and duplicated files", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single reconciliation cycle and print the detected changes
    Sync,

    /// Run cycles on the configured interval until interrupted
    Watch,

    /// Serve the HTTP API, optionally with the periodic scheduler
    Serve {
        #[arg(long)]
        no_scheduler: bool,
    },

    /// Report duplicate names and identical content in the latest inventory
    Anomalies {
        #[arg(short, long, value_name = "DIR")]
        export: Option<PathBuf>,

        #[arg(short, long)]
        pretty: bool,
    },

    /// Show the most recent cycle records
    History {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Check that the source and the persisted state are reachable
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    sharepoint_monitor::utils::logging::init_logger(cli.color, cli.verbose);

    info!("SharePoint Document Monitor");
    info!("Loading configuration from: {}", cli.config.display());

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using environment and defaults",
            cli.config.display()
        );
        Config::load(None).context("Failed to load configuration")?
    };

    match cli.command {
        Commands::Sync => cmd_sync(&config, cli.color).await?,
        Commands::Watch => cmd_watch(&config).await?,
        Commands::Serve { no_scheduler } => cmd_serve(&config, no_scheduler).await?,
        Commands::Anomalies { export, pretty } => cmd_anomalies(&config, export, pretty).await?,
        Commands::History { limit } => cmd_history(&config, limit).await?,
        Commands::Status => cmd_status(&config).await?,
    }

    Ok(())
}

fn build_runner(config: &Config) -> Result<CycleRunner> {
    CycleRunner::from_config(config).context("Failed to build document source")
}

async fn cmd_sync(config: &Config, colored_output: bool) -> Result<()> {
    let runner = build_runner(config)?.with_progress(colored_output);

    println!("{}", format_step(1, 2, &format!("Listing {}", runner.source().describe())));
    let report = match runner.run_cycle().await {
        Ok(report) => report,
        Err(e) => {
            println!("{}", format_error(&e.to_string()));
            return Err(e).context("Cycle failed");
        }
    };

    println!("{}", format_step(2, 2, "Reconciled against history"));
    println!(
        "{}",
        format_success(&format!(
            "{} files in inventory, {} changes ({} new, {} modified) in {:.2}s",
            report.inventory.len(),
            report.changes.len(),
            report.stats.new_files,
            report.stats.modified_files,
            report.stats.duration_ms as f64 / 1000.0
        ))
    );

    if report.stats.error_files > 0 {
        println!(
            "{}",
            format_warning(&format!(
                "{} files could not be fingerprinted",
                report.stats.error_files
            ))
        );
    }

    for change in &report.changes {
        let label = match change.kind {
            ChangeKind::New => "NEW".green().bold(),
            ChangeKind::Modified => "MODIFIED".yellow().bold(),
        };
        println!("  {:>9}  {}", label, change.name);
    }

    for record in report.inventory.iter().filter(|r| !r.has_readable_fingerprint()) {
        println!("  {:>9}  {}", format_state(record.state), record.name);
    }

    println!(
        "{}",
        format_info(&format!("Inventory written to {}", report.inventory_path.display()))
    );
    if let Some(key) = &report.object_key {
        println!("{}", format_info(&format!("Uploaded as {}", key)));
    }

    Ok(())
}

async fn cmd_watch(config: &Config) -> Result<()> {
    let runner = Arc::new(build_runner(config)?);
    let handle = CycleScheduler::from_config(runner, &config.scheduler).start();

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown requested, waiting for the running cycle");

    let completed = handle.stop().await;
    println!(
        "{}",
        format_success(&format!("Scheduler stopped after {} cycles", completed))
    );
    Ok(())
}

async fn cmd_serve(config: &Config, no_scheduler: bool) -> Result<()> {
    let runner = Arc::new(build_runner(config)?);
    let detector = AnomalyDetector::from_config(&config.anomaly)
        .context("Invalid anomaly configuration")?;
    let state = AppState::new(
        Arc::clone(&runner),
        detector,
        config.classification.default_category.clone(),
    );

    let scheduler = if no_scheduler {
        None
    } else {
        Some(CycleScheduler::from_config(Arc::clone(&runner), &config.scheduler).start())
    };

    let listener = api::bind(&config.api.bind_addr()).await?;
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
        }
    };
    api::serve(listener, state, shutdown)
        .await
        .context("API server failed")?;

    if let Some(handle) = scheduler {
        let completed = handle.stop().await;
        info!("Scheduler stopped after {} cycles", completed);
    }

    Ok(())
}

async fn cmd_anomalies(config: &Config, export: Option<PathBuf>, pretty: bool) -> Result<()> {
    let runner = build_runner(config)?;
    let detector = AnomalyDetector::from_config(&config.anomaly)
        .context("Invalid anomaly configuration")?;

    let rows = runner
        .inventory_sink()
        .load()
        .await
        .context("No inventory available, run `sync` first")?;
    let history = runner
        .history_store()
        .load()
        .await
        .context("Failed to load history")?;

    let records = api::records_from_rows(&rows, &history);
    let report = detector.detect(&records);

    println!(
        "{}",
        format_info(&format!(
            "{} files, {} duplicate name groups, {} identical content groups",
            report.total_files,
            report.summary.duplicate_name_groups,
            report.summary.duplicate_content_groups
        ))
    );

    for group in &report.duplicate_by_name {
        println!("\n{} ({} versions)", group.normalized_name.bold(), group.count);
        for version in &group.versions {
            let marker = if version.is_current_version {
                "current".green().to_string()
            } else {
                "older".dimmed().to_string()
            };
            println!(
                "  {:<8} {}  {}",
                marker,
                version.modified_at.format("%Y-%m-%d %H:%M:%S"),
                version.name
            );
        }
    }

    for group in &report.duplicate_by_fingerprint {
        println!(
            "\n{} {} ({} files)",
            "identical".cyan().bold(),
            &group.fingerprint[..group.fingerprint.len().min(12)],
            group.count
        );
        for file in &group.files {
            println!("  {}  {}", file.name, file.path);
        }
    }

    if report.is_clean() {
        println!("{}", format_success("No anomalies found"));
    }

    if let Some(dir) = export {
        let manifest = JsonExporter::new(dir)
            .export_all(&records, &report, pretty)
            .await
            .context("Export failed")?;
        println!(
            "{}",
            format_success(&format!("Exported {} files", manifest.files.len()))
        );
    }

    Ok(())
}

async fn cmd_history(config: &Config, limit: usize) -> Result<()> {
    let runner = build_runner(config)?;
    let records = runner
        .cycle_log()
        .load()
        .await
        .context("Failed to load cycle log")?;
    let stats = CycleLogStore::stats(&records);

    println!(
        "{}",
        format_info(&format!(
            "{} cycles recorded, {} changes in total",
            stats.total_records, stats.total_changes
        ))
    );

    for record in records.iter().rev().take(limit) {
        println!(
            "  {}  {:>5} files  {:>4} changes  {}",
            record.finished_at.format("%Y-%m-%d %H:%M:%S"),
            record.total_files,
            record.changes.len(),
            record.object_key.as_deref().unwrap_or("-").dimmed()
        );
    }

    Ok(())
}

async fn cmd_status(config: &Config) -> Result<()> {
    let runner = build_runner(config)?;

    let mut checks = vec![
        HealthCheck::probe("source", HealthStatus::Unhealthy, runner.source().ping()).await,
        HealthCheck::probe(
            "history store",
            HealthStatus::Unhealthy,
            runner.history_store().load(),
        )
        .await,
        HealthCheck::probe(
            "cycle log",
            HealthStatus::Degraded,
            runner.cycle_log().load(),
        )
        .await,
    ];

    if !runner.inventory_sink().exists() {
        checks.push(HealthCheck::degraded(
            "inventory",
            "no inventory written yet".to_string(),
            std::time::Duration::ZERO,
        ));
    }

    let report = HealthReport::new(checks, env!("CARGO_PKG_VERSION").to_string());
    println!("{}", report.format());

    if report.is_healthy() {
        println!("{}", format_success("All components healthy"));
    } else if report.overall_status == HealthStatus::Unhealthy {
        return Err(anyhow::anyhow!("Monitor is unhealthy"));
    }
    Ok(())
}
