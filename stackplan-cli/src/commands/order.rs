//! Order command implementation.
//!
//! Prints the provisioning units of the selected deployment in apply order,
//! or in teardown order with `--teardown`.

use crate::error::CliError;
use crate::utils::{load_registry, DeploymentArgs, GlobalOptions};
use clap::Args;
use stackplan::DeploymentPlanner;

/// Print the apply or teardown order of the provisioning units.
#[derive(Args)]
pub struct OrderCommand {
    #[command(flatten)]
    pub deployment: DeploymentArgs,

    /// Print teardown order (dependents first)
    #[arg(long)]
    pub teardown: bool,
}

impl OrderCommand {
    /// Execute the order command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let (registry, _) = load_registry(global)?;
        let context = self.deployment.resolve(&registry)?;

        let graph = DeploymentPlanner::build_graph(registry.topology())?;
        let order = if self.teardown {
            graph.reverse_order()?
        } else {
            graph.topological_order()?
        };

        for id in &order {
            if global.quiet {
                println!("{id}");
            } else {
                println!("{id}\t{}", context.stack_name(id));
            }
        }

        Ok(())
    }
}
