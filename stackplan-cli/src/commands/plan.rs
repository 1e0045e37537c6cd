//! Plan command implementation.
//!
//! Resolves the selected deployment and prints its full plan: sizing, tags,
//! every provisioning unit in apply order with its rules and routing, and
//! the stable address work. Nothing is provisioned.

use crate::error::CliError;
use crate::utils::{existing_bindings, load_registry, DeploymentArgs, GlobalOptions};
use clap::Args;
use ipnet::Ipv4Net;
use stackplan::network::AdminAccessRequest;
use stackplan::output::OutputFormat;
use stackplan::{DeploymentPlanner, PlanOptions, Port};
use std::path::PathBuf;

/// Print the deployment plan for an environment and location.
#[derive(Args)]
pub struct PlanCommand {
    #[command(flatten)]
    pub deployment: DeploymentArgs,

    /// Output format
    #[arg(
        long,
        value_enum,
        default_value = "text",
        env = "STACKPLAN_OUTPUT_FORMAT",
        ignore_case = true
    )]
    pub format: OutputFormat,

    /// Grant temporary administrative access from this range (non-production only)
    #[arg(long, value_name = "CIDR")]
    pub admin_cidr: Option<Ipv4Net>,

    /// Port for administrative access
    #[arg(long, value_name = "PORT", requires = "admin_cidr")]
    pub admin_port: Option<u16>,

    /// Hours the administrative rule may exist
    #[arg(long, value_name = "HOURS", requires = "admin_cidr")]
    pub admin_hours: Option<u32>,

    /// Write the plan to a file instead of stdout
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl PlanCommand {
    /// Execute the plan command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let (registry, _) = load_registry(global)?;
        let context = self.deployment.resolve(&registry)?;

        let options = PlanOptions::new().with_admin_access(self.admin_access()?);
        let existing = existing_bindings(global, &context)?;
        let plan = DeploymentPlanner::new(&registry, &context).plan(&options, &existing)?;

        for warning in &plan.warnings {
            log::warn!("{warning}");
        }

        let rendered = self.format.create_formatter().format_plan(&plan)?;
        match self.output {
            Some(path) => {
                std::fs::write(&path, rendered)?;
                if !global.quiet {
                    eprintln!("Wrote plan for {} to {}", plan.context.environment, path.display());
                }
            }
            None => println!("{}", rendered.trim_end()),
        }

        Ok(())
    }

    fn admin_access(&self) -> Result<Option<AdminAccessRequest>, CliError> {
        let Some(source) = self.admin_cidr else {
            return Ok(None);
        };

        let mut request = AdminAccessRequest::new(source.trunc());
        if let Some(port) = self.admin_port {
            let port = Port::try_from(port)
                .map_err(|e| CliError::InvalidArguments(e.to_string()))?;
            request = request.with_port(port);
        }
        if let Some(hours) = self.admin_hours {
            request = request.with_duration_hours(hours);
        }
        Ok(Some(request))
    }
}
