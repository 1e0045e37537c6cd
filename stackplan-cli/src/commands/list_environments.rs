//! List-environments command implementation.

use crate::error::CliError;
use crate::utils::{load_registry, GlobalOptions};
use clap::Args;

/// List the environments the registry defines.
#[derive(Args)]
pub struct ListEnvironmentsCommand {}

impl ListEnvironmentsCommand {
    /// Execute the list-environments command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let (registry, _) = load_registry(global)?;

        for profile in registry.list_environments() {
            if global.quiet {
                println!("{}", profile.id);
                continue;
            }
            let marker = if profile.is_production { " [production]" } else { "" };
            println!(
                "{}\t{}{marker}\t{}",
                profile.id, profile.size_class, profile.description
            );
        }

        Ok(())
    }
}
