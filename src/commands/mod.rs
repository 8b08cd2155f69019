//! Command dispatch: routes a parsed [`crate::cli::Commands`] to its
//! execution module.

mod analyze_command;
mod catalog_command;
mod config_command;
mod conflicts_command;
mod deliver_command;

use crate::cli::Commands;
use crate::config::Config;

/// Dispatch `command`, running it against `config`.
pub async fn dispatch(command: Commands, config: &Config) -> crate::Result<()> {
    match command {
        Commands::Analyze(args) => analyze_command::execute(args, config).await,
        Commands::Deliver(args) => deliver_command::execute(args, config).await,
        Commands::Catalog(args) => catalog_command::execute(args, config).await,
        Commands::Conflicts(args) => conflicts_command::execute(args, config).await,
        Commands::Config(args) => config_command::execute(args, config).await,
        Commands::Completions(args) => {
            let mut cmd = <crate::cli::Cli as clap::CommandFactory>::command();
            let cmd_name = cmd.get_name().to_string();
            let mut stdout = std::io::stdout();
            clap_complete::generate(args.shell, &mut cmd, cmd_name, &mut stdout);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CompletionsArgs;

    #[tokio::test]
    async fn completions_dispatch_never_fails() {
        let config = Config::default();
        let result = dispatch(
            Commands::Completions(CompletionsArgs { shell: clap_complete::Shell::Bash }),
            &config,
        )
        .await;
        assert!(result.is_ok());
    }
}
