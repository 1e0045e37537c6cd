//! Command to validate a stackplan registry file.

use crate::error::CliError;
use crate::utils::GlobalOptions;
use clap::Args;
use stackplan::{ConfigRegistry, RegistryLoader};
use std::path::PathBuf;

/// Validate a registry file.
#[derive(Args)]
pub struct ValidateCommand {
    /// Registry file to validate
    #[arg(value_name = "REGISTRY_PATH")]
    pub registry_path: PathBuf,
}

impl ValidateCommand {
    /// Execute the validate command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        if !self.registry_path.exists() {
            return Err(CliError::InvalidArguments(format!(
                "File not found: {}",
                self.registry_path.display()
            )));
        }

        let file = match RegistryLoader::load_file(&self.registry_path) {
            Ok(file) => file,
            Err(e) => {
                eprintln!("Parse error: {e}");
                return Err(CliError::SemanticFailure(
                    "Registry file is invalid".to_string(),
                ));
            }
        };

        match ConfigRegistry::from_file(file) {
            Ok(registry) => {
                if !global.quiet {
                    println!(
                        "Registry is valid: {} environments, {} locations, {} units",
                        registry.list_environments().len(),
                        registry.list_locations().len(),
                        registry.topology().units.len()
                    );
                }
                Ok(())
            }
            Err(e) => {
                eprintln!("Validation error: {e}");
                Err(CliError::SemanticFailure(
                    "Registry validation failed".to_string(),
                ))
            }
        }
    }
}
