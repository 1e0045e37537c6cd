//! List-bindings command implementation.
//!
//! Displays stored stable address bindings as a table, JSON, YAML, CSV or
//! TSV. Unlike the other binding commands, the deployment flags here only
//! filter; with neither set every binding is listed.

use crate::error::CliError;
use crate::utils::{format_timestamp, open_database_if_exists, GlobalOptions};
use clap::{Args, ValueEnum};
use stackplan::output::OutputFormat as LibFormat;
use stackplan::{Database, StableAddressBinding};
use std::io::Write;

/// Column headers for CSV/TSV output.
const COLUMN_HEADERS: [&str; 8] = [
    "environment",
    "location",
    "traffic_class",
    "address",
    "allocation_id",
    "state",
    "bound_resource",
    "updated_at",
];

/// List stored stable address bindings.
#[derive(Args)]
pub struct ListBindingsCommand {
    /// Output format
    #[arg(
        long,
        value_enum,
        default_value = "table",
        env = "STACKPLAN_OUTPUT_FORMAT",
        ignore_case = true
    )]
    pub format: OutputFormat,

    /// Only bindings of this environment
    #[arg(long, short = 'e', value_name = "ENVIRONMENT")]
    pub environment: Option<String>,

    /// Only bindings in this location
    #[arg(long, short = 'l', value_name = "LOCATION")]
    pub location: Option<String>,

    /// Include released bindings
    #[arg(long)]
    pub all: bool,
}

/// Output format for the list-bindings command.
#[derive(Clone, Copy, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable listing
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// CSV format
    Csv,
    /// TSV format (tab-separated values)
    Tsv,
}

impl ListBindingsCommand {
    /// Execute the list-bindings command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let mut bindings = match open_database_if_exists(global)? {
            Some(db) => Database::list_bindings(
                db.connection(),
                self.environment.as_deref(),
                self.location.as_deref(),
            )?,
            None => Vec::new(),
        };
        if !self.all {
            bindings.retain(StableAddressBinding::is_active);
        }

        match self.format {
            OutputFormat::Table => print_with(LibFormat::Text, &bindings)?,
            OutputFormat::Json => print_with(LibFormat::Json, &bindings)?,
            OutputFormat::Yaml => print_with(LibFormat::Yaml, &bindings)?,
            OutputFormat::Csv => format_as_delimited(&bindings, b',')?,
            OutputFormat::Tsv => format_as_delimited(&bindings, b'\t')?,
        }

        Ok(())
    }
}

fn print_with(format: LibFormat, bindings: &[StableAddressBinding]) -> Result<(), CliError> {
    let rendered = format.create_formatter().format_bindings(bindings)?;
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", rendered.trim_end())?;
    Ok(())
}

/// Convert csv::Error to CliError.
fn csv_error(e: csv::Error) -> CliError {
    CliError::Io(std::io::Error::other(e))
}

/// Format bindings as delimited output (CSV or TSV).
fn format_as_delimited(bindings: &[StableAddressBinding], delimiter: u8) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    let handle = stdout.lock();
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(handle);

    writer.write_record(COLUMN_HEADERS).map_err(csv_error)?;

    for binding in bindings {
        writer
            .write_record(&[
                binding.key.environment.clone(),
                binding.key.location.clone(),
                binding.key.traffic_class.clone(),
                binding.address.address.to_string(),
                binding.address.allocation_id.clone(),
                binding.state.to_string(),
                binding.bound_resource_id.clone().unwrap_or_default(),
                format_timestamp(binding.updated_at),
            ])
            .map_err(csv_error)?;
    }

    writer.flush()?;

    Ok(())
}
