//! Arguments for the `sonargate analyze` subcommand.

use std::path::PathBuf;

use clap::Args;

/// Run the analyzer suite over a single audio file and print its reports.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Audio file to analyze.
    pub path: PathBuf,

    /// Target platforms for the ReplayGain analyzer's recommendations.
    #[arg(short, long = "platform", value_name = "ID")]
    pub platforms: Vec<String>,

    /// Emit the raw analyzer reports as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}
