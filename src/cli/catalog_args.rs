//! Arguments for the `sonargate catalog` subcommand.

use std::path::PathBuf;

use clap::Args;

/// Batch-analyze and classify a directory of audio files.
#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Root directory to scan.
    #[arg(long = "catalog", value_name = "PATH")]
    pub catalog: PathBuf,

    /// JSON file mapping filename to `{subgenre, confidence}`, for accuracy
    /// scoring against a known-good labeling.
    #[arg(long = "ground-truth", value_name = "PATH")]
    pub ground_truth: Option<PathBuf>,

    /// Where to write the summary JSON; the full per-file array is written
    /// alongside it as `<output>` with `.full.json` replacing the extension.
    #[arg(long = "output", value_name = "PATH")]
    pub output: PathBuf,

    /// Process only a random sample of this many files.
    #[arg(long = "sample", value_name = "N")]
    pub sample: Option<usize>,

    /// Concurrent analyzer runs within a batch.
    #[arg(long = "parallel", value_name = "N", default_value_t = 4)]
    pub parallel: usize,

    /// Print per-file progress as the batches run.
    #[arg(short, long)]
    pub verbose: bool,
}
