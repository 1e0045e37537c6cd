//! List-locations command implementation.

use crate::error::CliError;
use crate::utils::{load_registry, GlobalOptions};
use clap::Args;

/// List the locations the registry defines.
#[derive(Args)]
pub struct ListLocationsCommand {}

impl ListLocationsCommand {
    /// Execute the list-locations command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let (registry, _) = load_registry(global)?;

        for profile in registry.list_locations() {
            if global.quiet {
                println!("{}", profile.id);
                continue;
            }
            let marker = if profile.is_primary { " [primary]" } else { "" };
            println!(
                "{}\t{}\t{} zones{marker}",
                profile.id, profile.display_name, profile.zone_count
            );
        }

        Ok(())
    }
}
