//! Release-address command implementation.

use crate::error::CliError;
use crate::utils::{
    binding_key, load_registry, open_database, print_binding, DeploymentArgs, GlobalOptions,
};
use clap::Args;
use stackplan::EndpointStabilityManager;

/// Release the stable address of a traffic class.
///
/// The record is kept with state `released`; the address may then be
/// bound elsewhere.
#[derive(Args)]
pub struct ReleaseAddressCommand {
    #[command(flatten)]
    pub deployment: DeploymentArgs,

    /// Traffic class whose address to release
    #[arg(long, short = 'c', value_name = "CLASS", default_value = "streaming-ingest")]
    pub traffic_class: String,
}

impl ReleaseAddressCommand {
    /// Execute the release-address command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let (registry, _) = load_registry(global)?;
        let context = self.deployment.resolve(&registry)?;
        let key = binding_key(&registry, &context, &self.traffic_class)?;

        let mut db = open_database(global)?;
        let binding = EndpointStabilityManager::new(&mut db).release(&key)?;

        print_binding(&binding, global.quiet);
        Ok(())
    }
}
