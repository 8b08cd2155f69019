//! Arguments for the `sonargate completions` subcommand.

use clap::Args;
use clap_complete::Shell;

/// Generate a shell completion script.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    pub shell: Shell,
}
