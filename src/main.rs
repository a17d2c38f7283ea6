use apphub::cli::{run_cli, Cli, Commands};
use apphub::logging::{init_logging_with_config, LogConfig};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // `apps` prints JSON on stdout; keep log lines out of it.
    let _guard = match cli.command {
        Commands::Serve { .. } => init_logging_with_config(&LogConfig::from_env())?,
        Commands::Apps { .. } => None,
    };
    run_cli(cli)
}
