//! Build script for stackplan-cli.
//!
//! Generates the man page at build time using clap_mangen and places it in
//! OUT_DIR for inclusion in release builds.
//!
//! Build scripts cannot depend on the crate being built, so the command
//! structure is declared here by hand.

use clap::{Arg, Command};
use clap_mangen::Man;
use std::fs;
use std::path::PathBuf;

fn deployment_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("environment")
            .long("environment")
            .short('e')
            .value_name("ENVIRONMENT")
            .help("Deployment environment (e.g. beta, staging, production)"),
    )
    .arg(
        Arg::new("location")
            .long("location")
            .short('l')
            .value_name("LOCATION")
            .help("Deployment location (e.g. eu-west-1)"),
    )
}

/// Build the CLI command structure for man page generation.
///
/// Keep this structure synchronized with src/cli.rs.
fn build_cli() -> Command {
    Command::new("stackplan")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Plan multi-environment stream deployments")
        .long_about(
            "Resolve deployment contexts, plan network segmentation and provisioning order, \
             and manage stable public addresses across environments and locations",
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Enable verbose output")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .help("Suppress non-essential output")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .help("Override the data directory location")
                .value_name("PATH")
                .global(true)
                .env("STACKPLAN_DATA_DIR"),
        )
        .arg(
            Arg::new("registry")
                .long("registry")
                .help("Registry file to use instead of discovery")
                .value_name("PATH")
                .global(true)
                .env("STACKPLAN_REGISTRY"),
        )
        .arg(
            Arg::new("busy-timeout")
                .long("busy-timeout")
                .help("Override the default busy timeout (in seconds)")
                .value_name("SECONDS")
                .global(true)
                .env("STACKPLAN_BUSY_TIMEOUT"),
        )
        .subcommands(vec![
            deployment_args(Command::new("plan"))
                .about("Print the deployment plan")
                .long_about("Print sizing, tags, units, rules, routing and stable address work"),
            deployment_args(Command::new("order"))
                .about("Print the provisioning order")
                .long_about("Print the units in apply order, or teardown order with --teardown"),
            deployment_args(Command::new("show-context"))
                .about("Show the resolved deployment context"),
            Command::new("list-environments").about("List registry environments"),
            Command::new("list-locations").about("List registry locations"),
            Command::new("validate")
                .about("Validate a registry file")
                .long_about("Parse and validate a stackplan registry file"),
            deployment_args(Command::new("bind-address"))
                .about("Record a stable address for a traffic class"),
            deployment_args(Command::new("associate"))
                .about("Point a stable address at a resource"),
            deployment_args(Command::new("reassociate"))
                .about("Move a stable address to a replacement resource")
                .long_about(
                    "Move a stable address, refusing if the store names a different current holder",
                ),
            deployment_args(Command::new("release-address")).about("Release a stable address"),
            Command::new("list-bindings")
                .about("List stored stable address bindings")
                .long_about("Display stable address bindings as a table, JSON, YAML, CSV or TSV"),
            Command::new("completions")
                .about("Generate shell completion scripts")
                .long_about("Generate shell completion scripts for bash, zsh, fish, or PowerShell"),
        ])
}

fn main() {
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).unwrap();

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    man.render(&mut buffer).unwrap();

    fs::write(man_dir.join("stackplan.1"), buffer).unwrap();

    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-changed=src/commands/");
}
