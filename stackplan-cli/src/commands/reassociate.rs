//! Reassociate command implementation.
//!
//! Moves a stable address from the resource that holds it to its
//! replacement. The caller names the resource it believes is bound; if the
//! store disagrees the move is refused, so two operators racing on the
//! same binding cannot both win.

use crate::error::CliError;
use crate::utils::{
    binding_key, load_registry, open_database, print_binding, DeploymentArgs, GlobalOptions,
};
use clap::Args;
use stackplan::EndpointStabilityManager;

/// Move a stable address to a replacement resource.
#[derive(Args)]
pub struct ReassociateCommand {
    #[command(flatten)]
    pub deployment: DeploymentArgs,

    /// Traffic class whose address to move
    #[arg(long, short = 'c', value_name = "CLASS", default_value = "streaming-ingest")]
    pub traffic_class: String,

    /// Resource currently holding the address
    #[arg(long, value_name = "RESOURCE_ID")]
    pub from: String,

    /// Replacement resource
    #[arg(value_name = "RESOURCE_ID")]
    pub to: String,
}

impl ReassociateCommand {
    /// Execute the reassociate command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let (registry, _) = load_registry(global)?;
        let context = self.deployment.resolve(&registry)?;
        let key = binding_key(&registry, &context, &self.traffic_class)?;

        let mut db = open_database(global)?;
        let binding =
            EndpointStabilityManager::new(&mut db).reassociate(&key, &self.from, &self.to)?;

        print_binding(&binding, global.quiet);
        Ok(())
    }
}
