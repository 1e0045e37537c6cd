//! Bind-address command implementation.
//!
//! Records a provider-allocated address as the stable address of one
//! traffic class. Repeating the command with the same address is a no-op.

use crate::error::CliError;
use crate::utils::{
    binding_key, load_registry, open_database, print_binding, DeploymentArgs, GlobalOptions,
};
use clap::Args;
use stackplan::binding::StableAddress;
use stackplan::EndpointStabilityManager;
use std::net::Ipv4Addr;

/// Record a stable address for a traffic class.
#[derive(Args)]
pub struct BindAddressCommand {
    #[command(flatten)]
    pub deployment: DeploymentArgs,

    /// Traffic class the address fronts
    #[arg(long, short = 'c', value_name = "CLASS", default_value = "streaming-ingest")]
    pub traffic_class: String,

    /// Provider allocation id of the address
    #[arg(long, value_name = "ID")]
    pub allocation_id: String,

    /// The public address
    #[arg(value_name = "ADDRESS")]
    pub address: Ipv4Addr,
}

impl BindAddressCommand {
    /// Execute the bind-address command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let (registry, _) = load_registry(global)?;
        let context = self.deployment.resolve(&registry)?;
        let key = binding_key(&registry, &context, &self.traffic_class)?;

        let mut db = open_database(global)?;
        let address = StableAddress::new(self.address, self.allocation_id);
        let binding = EndpointStabilityManager::new(&mut db).allocate(&key, &address)?;

        print_binding(&binding, global.quiet);
        Ok(())
    }
}
