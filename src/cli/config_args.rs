//! Arguments for the `sonargate config` subcommand.

use clap::{Args, Subcommand};

/// Inspect the effective configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// `sonargate config` subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration (defaults + file + env) as TOML.
    Show,
    /// Validate the effective configuration without printing it.
    Validate,
    /// Validate and persist one `section.field` key into the config file.
    Set {
        /// Dotted key, e.g. `general.worker_pool_size`.
        key: String,
        /// New value, parsed according to the field's type.
        value: String,
    },
}
