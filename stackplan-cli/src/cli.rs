//! CLI structure and command definitions.
//!
//! This module defines the main CLI structure using clap's derive macros,
//! including global options and subcommands.

use crate::commands::{
    AssociateCommand, BindAddressCommand, CompletionsCommand, ListBindingsCommand,
    ListEnvironmentsCommand, ListLocationsCommand, OrderCommand, PlanCommand, ReassociateCommand,
    ReleaseAddressCommand, ShowContextCommand, ValidateCommand,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Plan multi-environment, multi-region stream deployments.
#[derive(Parser)]
#[command(name = "stackplan")]
#[command(version, about = "Plan multi-environment stream deployments", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Override the data directory location
    #[arg(long, value_name = "PATH", global = true, env = "STACKPLAN_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Registry file to use instead of discovery
    #[arg(long, value_name = "PATH", global = true, env = "STACKPLAN_REGISTRY")]
    pub registry: Option<PathBuf>,

    /// Override the default busy timeout (in seconds)
    #[arg(long, value_name = "SECONDS", global = true, env = "STACKPLAN_BUSY_TIMEOUT")]
    pub busy_timeout: Option<u32>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Print the deployment plan
    Plan(PlanCommand),

    /// Print the provisioning order
    Order(OrderCommand),

    /// Show the resolved deployment context
    ShowContext(ShowContextCommand),

    /// List registry environments
    ListEnvironments(ListEnvironmentsCommand),

    /// List registry locations
    ListLocations(ListLocationsCommand),

    /// Validate a registry file
    Validate(ValidateCommand),

    /// Record a stable address for a traffic class
    BindAddress(BindAddressCommand),

    /// Point a stable address at a resource
    Associate(AssociateCommand),

    /// Move a stable address to a replacement resource
    Reassociate(ReassociateCommand),

    /// Release a stable address
    ReleaseAddress(ReleaseAddressCommand),

    /// List stored stable address bindings
    ListBindings(ListBindingsCommand),

    /// Generate shell completion scripts
    Completions(CompletionsCommand),
}
