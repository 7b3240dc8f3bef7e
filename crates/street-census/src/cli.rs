//! Command-line interface definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Track street centerline segments across daily snapshots, keeping stable
/// segment identifiers in an append-only registry.
///
/// All geometry is expected in one fixed working projection (a planar CRS
/// with a linear unit); reprojection happens upstream.
#[derive(Debug, Parser)]
#[command(name = "street-census", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Seed a fresh registry from a centerlines file, assigning ids from 0
    Bootstrap {
        /// GeoJSON FeatureCollection of street centerlines
        #[arg(long)]
        centerlines: PathBuf,
        /// Where to write the seeded registry
        #[arg(long)]
        registry: PathBuf,
    },
    /// Reconcile one daily snapshot against the registry and export the results
    Reconcile(ReconcileArgs),
}

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Persisted registry GeoJSON, read and written back in place
    #[arg(long)]
    pub registry: PathBuf,

    /// Daily observation snapshot GeoJSON
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Anchor distance cutoff for a match, in working linear units
    #[arg(long, default_value_t = 10.0)]
    pub dist_cutoff: f64,

    /// Length-difference cutoff for a match, in working linear units
    #[arg(long, default_value_t = 10.0)]
    pub len_cutoff: f64,

    /// Where to write this run's annotated rows
    #[arg(long, default_value = "daily-data.csv")]
    pub daily_csv: PathBuf,

    /// Cumulative deduplicated export, appended to across runs
    #[arg(long, default_value = "daily-data-combined.csv")]
    pub combined_csv: PathBuf,

    /// Snapshot properties holding epoch-millisecond timestamps
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "recycling_time_visited,rubbish_time_visited"
    )]
    pub time_columns: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_defaults() {
        let cli = Cli::try_parse_from([
            "street-census",
            "reconcile",
            "--registry",
            "registry.geojson",
            "--snapshot",
            "latest.geojson",
        ])
        .unwrap();

        let Command::Reconcile(args) = cli.command else {
            panic!("expected reconcile");
        };
        assert_eq!(args.dist_cutoff, 10.0);
        assert_eq!(args.len_cutoff, 10.0);
        assert_eq!(
            args.time_columns,
            vec!["recycling_time_visited", "rubbish_time_visited"]
        );
    }

    #[test]
    fn test_cutoffs_are_overridable() {
        let cli = Cli::try_parse_from([
            "street-census",
            "reconcile",
            "--registry",
            "r.geojson",
            "--snapshot",
            "s.geojson",
            "--dist-cutoff",
            "25",
            "--len-cutoff",
            "5",
        ])
        .unwrap();

        let Command::Reconcile(args) = cli.command else {
            panic!("expected reconcile");
        };
        assert_eq!(args.dist_cutoff, 25.0);
        assert_eq!(args.len_cutoff, 5.0);
    }

    #[test]
    fn test_bootstrap_parses() {
        let cli = Cli::try_parse_from([
            "street-census",
            "bootstrap",
            "--centerlines",
            "centerlines.geojson",
            "--registry",
            "registry.geojson",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Bootstrap { .. }));
    }
}
