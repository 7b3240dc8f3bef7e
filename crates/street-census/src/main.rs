//! Street Census - Daily Street Segment Pipeline
//!
//! One run per day: load the persisted registry, reconcile the latest
//! snapshot of observed street geometries against it, persist the grown
//! registry, and export the annotated batch as CSV. The identity-resolution
//! engine itself lives in `street-census-lib`; this binary owns every
//! external concern (files, formats, timestamps, logging).

mod cli;
mod error;
mod export;
mod snapshot;
mod store;

use clap::Parser;
use cli::{Cli, Command, ReconcileArgs};
use error::Result;
use geo::LineString;
use std::path::Path;
use street_census_lib::{Registry, Thresholds};

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Bootstrap {
            centerlines,
            registry,
        } => run_bootstrap(&centerlines, &registry),
        Command::Reconcile(args) => run_reconcile(&args),
    };

    if let Err(error) = outcome {
        tracing::error!("{error}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Seed a brand-new registry: every centerline is taken as-is with a fresh id.
fn run_bootstrap(centerlines: &Path, registry_path: &Path) -> Result<()> {
    let records = snapshot::load_snapshot(centerlines)?;
    let geometries: Vec<LineString<f64>> = records.into_iter().map(|r| r.geometry).collect();

    let registry = Registry::bootstrap(geometries)?;
    store::save_registry(registry_path, &registry)?;

    tracing::info!(
        "Seeded registry with {} segments at {}",
        registry.len(),
        registry_path.display()
    );
    Ok(())
}

/// One daily run: read-modify-write the registry, then export.
fn run_reconcile(args: &ReconcileArgs) -> Result<()> {
    let registry = store::load_registry(&args.registry)?;
    tracing::info!(
        "Loaded registry with {} segments from {}",
        registry.len(),
        args.registry.display()
    );

    let mut records = snapshot::load_snapshot(&args.snapshot)?;
    snapshot::normalize_times(&mut records, &args.time_columns);
    tracing::info!(
        "Loaded snapshot with {} records from {}",
        records.len(),
        args.snapshot.display()
    );

    let thresholds = Thresholds {
        dist_cutoff: args.dist_cutoff,
        len_cutoff: args.len_cutoff,
    };
    let batch: Vec<LineString<f64>> = records.iter().map(|r| r.geometry.clone()).collect();
    let outcome = registry.reconcile(&batch, &thresholds)?;

    store::save_registry(&args.registry, &outcome.registry)?;

    let header = export::header_for(&records);
    let rows = export::rows_for(&records, &outcome.assigned_ids, &header);
    export::write_daily_csv(&args.daily_csv, &header, &rows)?;
    export::append_combined_csv(&args.combined_csv, &header, &rows)?;

    tracing::info!(
        "Registry now holds {} segments ({} novel this run)",
        outcome.registry.len(),
        outcome.registry.len() - registry.len()
    );
    Ok(())
}
