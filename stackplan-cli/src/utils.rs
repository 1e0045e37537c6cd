//! Utility functions for CLI operations.
//!
//! Registry loading, deployment selection, binding store access and a few
//! display helpers shared by the commands.

use crate::error::CliError;
use clap::Args;
use stackplan::config::RegistrySource;
use stackplan::database::{database_path, resolve_data_dir};
use stackplan::{
    BindingKey, ConfigRegistry, Database, DatabaseConfig, DeploymentContext, InvocationInputs,
    RegistryLoader, StableAddressBinding,
};
use std::env;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Global CLI options shared across all commands.
#[derive(Debug, Clone)]
#[allow(dead_code)] // verbose only feeds the logger in main.rs
pub struct GlobalOptions {
    /// Enable verbose output.
    pub verbose: bool,

    /// Suppress non-essential output.
    pub quiet: bool,

    /// Override the data directory location.
    pub data_dir: Option<PathBuf>,

    /// Explicit registry file.
    pub registry: Option<PathBuf>,

    /// Override the default busy timeout (in seconds).
    pub busy_timeout: Option<u32>,
}

/// Selects the deployment a command targets.
///
/// Unset flags fall back to `STACKPLAN_ENVIRONMENT` / `STACKPLAN_LOCATION`,
/// then to `beta` in the registry's primary location.
#[derive(Args, Debug, Clone, Default)]
pub struct DeploymentArgs {
    /// Deployment environment (e.g. beta, staging, production)
    #[arg(long, short = 'e', value_name = "ENVIRONMENT")]
    pub environment: Option<String>,

    /// Deployment location (e.g. eu-west-1)
    #[arg(long, short = 'l', value_name = "LOCATION")]
    pub location: Option<String>,
}

impl DeploymentArgs {
    /// Resolve the selected deployment against the registry.
    pub fn resolve(&self, registry: &ConfigRegistry) -> Result<DeploymentContext, CliError> {
        let inputs = InvocationInputs::resolve(
            registry,
            self.environment.as_deref(),
            self.location.as_deref(),
        )?;
        Ok(DeploymentContext::from_inputs(registry, &inputs)?)
    }
}

/// Load the registry: `--registry`, `STACKPLAN_REGISTRY`, the nearest
/// `stackplan.yaml`, or the built-in one.
pub fn load_registry(global: &GlobalOptions) -> Result<(ConfigRegistry, RegistrySource), CliError> {
    let cwd = env::current_dir()?;
    let loaded = RegistryLoader::load(global.registry.as_deref(), &cwd)?;
    log::debug!("using {}", loaded.1);
    Ok(loaded)
}

/// Resolve the data directory from global options.
pub fn resolve_data_directory(global: &GlobalOptions) -> Result<PathBuf, CliError> {
    match global.data_dir {
        Some(ref dir) => Ok(dir.clone()),
        None => resolve_data_dir().map_err(|e| CliError::Config(e.to_string())),
    }
}

fn database_config(global: &GlobalOptions) -> Result<DatabaseConfig, CliError> {
    let path = database_path(&resolve_data_directory(global)?);
    let mut config = DatabaseConfig::new(path);
    if let Some(timeout_seconds) = global.busy_timeout {
        config = config.with_busy_timeout(Duration::from_secs(timeout_seconds.into()));
    }
    Ok(config)
}

/// Open the binding store for writing, creating it if needed.
pub fn open_database(global: &GlobalOptions) -> Result<Database, CliError> {
    Database::open(database_config(global)?).map_err(CliError::from)
}

/// Open the binding store read-only, or `None` if it was never created.
pub fn open_database_if_exists(global: &GlobalOptions) -> Result<Option<Database>, CliError> {
    let config = database_config(global)?.read_only();
    if !config.path.exists() {
        log::debug!("no binding store at {}", config.path.display());
        return Ok(None);
    }
    Database::open(config).map(Some).map_err(CliError::from)
}

/// Bindings currently stored for `context`, empty if there is no store.
pub fn existing_bindings(
    global: &GlobalOptions,
    context: &DeploymentContext,
) -> Result<Vec<StableAddressBinding>, CliError> {
    match open_database_if_exists(global)? {
        Some(db) => Ok(Database::list_bindings(
            db.connection(),
            Some(context.environment()),
            Some(context.location()),
        )?),
        None => Ok(Vec::new()),
    }
}

/// Build the binding key for `traffic_class`, refusing classes the
/// registry does not declare.
pub fn binding_key(
    registry: &ConfigRegistry,
    context: &DeploymentContext,
    traffic_class: &str,
) -> Result<BindingKey, CliError> {
    let classes = &registry.topology().traffic_classes;
    if !classes.iter().any(|c| c.id == traffic_class) {
        let valid: Vec<&str> = classes.iter().map(|c| c.id.as_str()).collect();
        return Err(CliError::InvalidArguments(format!(
            "unknown traffic class '{traffic_class}'; valid traffic classes: {}",
            valid.join(", ")
        )));
    }
    Ok(BindingKey::for_context(context, traffic_class))
}

/// Format a timestamp for display.
pub fn format_timestamp(ts: SystemTime) -> String {
    use chrono::{DateTime, Utc};
    let dt: DateTime<Utc> = ts.into();
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Shorten a path for display.
///
/// If the path is within the home directory, show it as ~/...
/// Otherwise, show the full path.
pub fn shorten_path(path: &Path) -> String {
    if let Some(home) = home::home_dir() {
        if let Ok(relative) = path.strip_prefix(&home) {
            return format!("~/{}", relative.display());
        }
    }
    path.display().to_string()
}

/// Print one binding after a change.
pub fn print_binding(binding: &StableAddressBinding, quiet: bool) {
    if quiet {
        println!("{}", binding.address.address);
        return;
    }
    println!(
        "{}: {} [{}] {}",
        binding.key,
        binding.address,
        binding.state,
        binding.bound_resource_id.as_deref().unwrap_or("-")
    );
}
