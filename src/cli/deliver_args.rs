//! Arguments for the `sonargate deliver` subcommand.

use std::path::PathBuf;

use clap::Args;

/// Validate, process, and upload one or more assets to target platforms.
#[derive(Args, Debug)]
pub struct DeliverArgs {
    /// Asset file(s) to deliver.
    #[arg(required = true)]
    pub assets: Vec<PathBuf>,

    /// Target platform ids (as found in the platform contract table).
    #[arg(short, long = "platform", required = true)]
    pub platforms: Vec<String>,

    /// JSON file with delivery metadata (title, artist, ISRC, ...).
    #[arg(short, long)]
    pub metadata: Option<PathBuf>,

    /// JSON file with the processing parameters (eqBoostMax,
    /// limiterThreshold, ...) that a PROCESS job would apply. Checked
    /// against the conflict catalog before any PROCESS job is enqueued.
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Emit the final `Delivery` record as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}
