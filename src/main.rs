//! apicheck - scenario runner for HTTP services
//!
//! Runs declarative scenarios against a service and checks the decoded
//! responses with dotted-path assertions.

use apicheck::{cli, commands, common::logging};
use clap::Parser;
use commands::Commands;

#[derive(Parser)]
#[command(name = "apicheck", about = "Scenario runner with dotted-path assertions")]
#[command(version, long_about = None)]
struct Cli {
    /// Also write logs to the data directory
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Test { verbose: true, .. });
    let _guard = if cli.log_file {
        let (path, guard) = logging::init_with_file(verbose);
        if let Some(path) = path {
            tracing::info!("logging to {}", path.display());
        }
        guard
    } else {
        logging::init_cli(verbose);
        None
    };

    if let Err(e) = cli::dispatch(cli.command) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
