//! Associate command implementation.

use crate::error::CliError;
use crate::utils::{
    binding_key, load_registry, open_database, print_binding, DeploymentArgs, GlobalOptions,
};
use clap::Args;
use stackplan::EndpointStabilityManager;

/// Point an unassociated stable address at a resource.
#[derive(Args)]
pub struct AssociateCommand {
    #[command(flatten)]
    pub deployment: DeploymentArgs,

    /// Traffic class whose address to associate
    #[arg(long, short = 'c', value_name = "CLASS", default_value = "streaming-ingest")]
    pub traffic_class: String,

    /// Resource that should hold the address
    #[arg(value_name = "RESOURCE_ID")]
    pub resource: String,
}

impl AssociateCommand {
    /// Execute the associate command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let (registry, _) = load_registry(global)?;
        let context = self.deployment.resolve(&registry)?;
        let key = binding_key(&registry, &context, &self.traffic_class)?;

        let mut db = open_database(global)?;
        let binding = EndpointStabilityManager::new(&mut db).associate(&key, &self.resource)?;

        print_binding(&binding, global.quiet);
        Ok(())
    }
}
