//! Main entry point for the stackplan CLI.
//!
//! Plans deployments of the streaming service across environments and
//! locations, and manages the stable public addresses that must survive
//! instance replacement.

mod cli;
mod commands;
mod error;
mod utils;

use clap::Parser;
use cli::Cli;
use utils::GlobalOptions;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = stackplan::init_logger(cli.verbose, cli.quiet).install() {
        eprintln!("Warning: could not install logger: {e}");
    }

    let global = GlobalOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        data_dir: cli.data_dir,
        registry: cli.registry,
        busy_timeout: cli.busy_timeout,
    };

    let result = match cli.command {
        cli::Command::Plan(cmd) => cmd.execute(&global),
        cli::Command::Order(cmd) => cmd.execute(&global),
        cli::Command::ShowContext(cmd) => cmd.execute(&global),
        cli::Command::ListEnvironments(cmd) => cmd.execute(&global),
        cli::Command::ListLocations(cmd) => cmd.execute(&global),
        cli::Command::Validate(cmd) => cmd.execute(&global),
        cli::Command::BindAddress(cmd) => cmd.execute(&global),
        cli::Command::Associate(cmd) => cmd.execute(&global),
        cli::Command::Reassociate(cmd) => cmd.execute(&global),
        cli::Command::ReleaseAddress(cmd) => cmd.execute(&global),
        cli::Command::ListBindings(cmd) => cmd.execute(&global),
        cli::Command::Completions(cmd) => cmd.execute(&global),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
