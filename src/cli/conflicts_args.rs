//! Arguments for the `sonargate conflicts` subcommand.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Inspect parameter combinations for conflicts ahead of processing.
#[derive(Args, Debug)]
pub struct ConflictsArgs {
    #[command(subcommand)]
    pub action: ConflictsAction,
}

/// `sonargate conflicts` subcommands.
#[derive(Subcommand, Debug)]
pub enum ConflictsAction {
    /// Validate a JSON parameter set against the conflict catalog.
    Check {
        /// JSON file with a flat `{currentAnalysis, proposedParams,
        /// presetIntent}`-style parameter object.
        file: PathBuf,
    },
}
