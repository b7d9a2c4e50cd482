//! `sync` command handlers: persisted runs, in-memory previews and run
//! history.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::Subcommand;
use erpbridge_core::{AppConfig, RunStatus, SyncRunReport};
use erpbridge_db::{PgAssetStore, PgCatalogStore};
use erpbridge_sync::{AssetImporter, ImageSync, InMemoryCatalog, SyncOrchestrator};
use uuid::Uuid;

use crate::connect;

/// Sub-commands available under `sync`.
#[derive(Debug, Subcommand)]
pub enum SyncCommands {
    /// Pull the ERP catalog into the storefront catalog and record the run
    Run {
        /// Only ask the ERP for products modified after this RFC 3339 timestamp
        #[arg(long)]
        since: Option<DateTime<Utc>>,
        /// Skip image import
        #[arg(long)]
        no_images: bool,
    },
    /// Sync into a throwaway in-memory catalog and print the report
    Preview {
        #[arg(long)]
        since: Option<DateTime<Utc>>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show recorded sync runs
    Runs {
        #[arg(long, default_value = "20")]
        limit: i64,
        /// Show one run with its error details
        #[arg(long)]
        id: Option<Uuid>,
    },
}

pub(crate) async fn run(config: &AppConfig, command: SyncCommands) -> anyhow::Result<()> {
    match command {
        SyncCommands::Run { since, no_images } => run_sync(config, since, !no_images).await,
        SyncCommands::Preview { since, json } => run_preview(config, since, json).await,
        SyncCommands::Runs { id: Some(id), .. } => show_run(config, id).await,
        SyncCommands::Runs { limit, id: None } => list_runs(config, limit).await,
    }
}

/// Attempt to mark a sync run as failed, logging any secondary error.
async fn fail_run_best_effort(pool: &sqlx::PgPool, run_id: i64, message: String) {
    if let Err(mark_err) = erpbridge_db::fail_sync_run(pool, run_id, &message).await {
        tracing::error!(run_id, error = %mark_err, "failed to mark sync run as failed");
    }
}

/// Runs a sync against Postgres and records it in `sync_runs`.
///
/// # Errors
///
/// Returns an error if the ERP client cannot be built, the run record cannot
/// be written, or the run itself reports `status = error`.
async fn run_sync(
    config: &AppConfig,
    since: Option<DateTime<Utc>>,
    with_images: bool,
) -> anyhow::Result<()> {
    let pool = connect(config).await?;
    let erp = erpbridge_erp::build_erp_client(config)?;

    let mut orchestrator =
        SyncOrchestrator::new(erp, Arc::new(PgCatalogStore::new(pool.clone())));
    if with_images {
        let importer = AssetImporter::from_config(config)?;
        let assets = Arc::new(PgAssetStore::new(pool.clone(), config.media_dir.clone()));
        orchestrator = orchestrator.with_images(ImageSync::new(importer, assets));
    }

    let run = erpbridge_db::create_sync_run(&pool, "cli", &config.erp_mode.to_string()).await?;
    if let Err(e) = erpbridge_db::start_sync_run(&pool, run.id).await {
        fail_run_best_effort(&pool, run.id, format!("{e:#}")).await;
        return Err(e.into());
    }

    let report = orchestrator.run(since).await;

    if let Err(e) = erpbridge_db::complete_sync_run(&pool, run.id, &report).await {
        fail_run_best_effort(&pool, run.id, format!("{e:#}")).await;
        return Err(e.into());
    }

    print_report(Some(run.public_id), &report);
    if report.status == RunStatus::Error {
        anyhow::bail!(
            "sync run {} failed: {}",
            run.public_id,
            report.message.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

/// Syncs into an in-memory catalog. Nothing is written to the database.
async fn run_preview(
    config: &AppConfig,
    since: Option<DateTime<Utc>>,
    json: bool,
) -> anyhow::Result<()> {
    let erp = erpbridge_erp::build_erp_client(config)?;
    let catalog = Arc::new(InMemoryCatalog::new());
    let report = SyncOrchestrator::new(erp, catalog.clone()).run(since).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(None, &report);
    let entries = catalog.entries().await;
    if !entries.is_empty() {
        println!();
        println!("{:<14}{:<18}{:>12}{:>8}  NAME", "ERP ID", "SKU", "PRICE", "STOCK");
        for entry in &entries {
            println!(
                "{:<14}{:<18}{:>12}{:>8}  {}",
                entry.external_erp_id.as_deref().unwrap_or("\u{2014}"),
                entry.sku,
                entry.sale_price.unwrap_or(entry.regular_price).to_string(),
                entry.stock_quantity,
                entry.name
            );
        }
    }
    Ok(())
}

fn print_report(run_id: Option<Uuid>, report: &SyncRunReport) {
    let label = run_id.map_or_else(|| "preview".to_string(), |id| format!("run {id}"));
    println!(
        "{label}: {} (processed={}, errors={}, created={}, updated={})",
        report.status.as_str(),
        report.processed,
        report.errors,
        report.created,
        report.updated
    );
    if let Some(message) = &report.message {
        println!("  {message}");
    }
    for detail in &report.details {
        println!("  - {detail}");
    }
}

async fn list_runs(config: &AppConfig, limit: i64) -> anyhow::Result<()> {
    let pool = connect(config).await?;
    let runs = erpbridge_db::list_sync_runs(&pool, limit).await?;

    if runs.is_empty() {
        println!("no sync runs recorded; run `sync run` first");
        return Ok(());
    }

    println!(
        "{:<38}{:<11}{:<11}{:<22}{:>10}{:>8}",
        "ID", "TRIGGER", "STATUS", "STARTED", "PROCESSED", "ERRORS"
    );
    for run in &runs {
        let started = run
            .started_at
            .map_or_else(|| "\u{2014}".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string());
        println!(
            "{:<38}{:<11}{:<11}{:<22}{:>10}{:>8}",
            run.public_id, run.trigger_source, run.status, started, run.items_processed, run.items_failed
        );
    }
    Ok(())
}

async fn show_run(config: &AppConfig, public_id: Uuid) -> anyhow::Result<()> {
    let pool = connect(config).await?;
    let run = erpbridge_db::get_sync_run_by_public_id(&pool, public_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("sync run '{public_id}' not found"))?;

    println!("Run:       {}", run.public_id);
    println!("Trigger:   {} ({})", run.trigger_source, run.erp_mode);
    println!("Status:    {}", run.status);
    println!(
        "Items:     processed={} errors={} created={} updated={}",
        run.items_processed, run.items_failed, run.items_created, run.items_updated
    );
    if let Some(message) = &run.message {
        println!("Message:   {message}");
    }

    let errors = erpbridge_db::list_sync_run_errors(&pool, run.id).await?;
    if !errors.is_empty() {
        println!();
        for error in &errors {
            println!("  - {}", error.detail);
        }
    }
    Ok(())
}
