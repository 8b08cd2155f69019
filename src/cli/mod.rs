//! Command-line interface.
//!
//! A `clap` subcommand application over the analysis/classification/
//! delivery core: `analyze` runs the analyzer suite over one file,
//! `deliver` runs an asset through the delivery orchestrator, `catalog`
//! runs the batched catalog validator, `conflicts` and
//! `config` are ambient ergonomics for inspecting the parameter-conflict
//! catalog and effective configuration, and `completions` emits shell
//! completion scripts.

mod analyze_args;
mod catalog_args;
mod completions_args;
mod config_args;
mod conflicts_args;
mod deliver_args;
pub mod table;
pub mod ui;

pub use analyze_args::AnalyzeArgs;
pub use catalog_args::CatalogArgs;
use clap::{Parser, Subcommand};
pub use completions_args::CompletionsArgs;
pub use config_args::{ConfigAction, ConfigArgs};
pub use conflicts_args::{ConflictsAction, ConflictsArgs};
pub use deliver_args::DeliverArgs;

/// Top-level CLI application structure.
#[derive(Parser, Debug)]
#[command(name = "sonargate")]
#[command(about = "Audio quality analysis and delivery orchestration for music production catalogs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the analyzer suite over a single audio file.
    Analyze(AnalyzeArgs),

    /// Validate, process, and upload assets to target platforms.
    Deliver(DeliverArgs),

    /// Batch-analyze and classify a directory of audio files.
    Catalog(CatalogArgs),

    /// Inspect parameter combinations for conflicts.
    Conflicts(ConflictsArgs),

    /// Inspect the effective configuration.
    Config(ConfigArgs),

    /// Generate a shell completion script.
    Completions(CompletionsArgs),
}

/// Parse `std::env::args` and dispatch to the selected subcommand,
/// running against `config`.
pub async fn run(config: crate::config::Config) -> crate::Result<()> {
    let cli = Cli::parse();
    crate::commands::dispatch(cli.command, &config).await
}
