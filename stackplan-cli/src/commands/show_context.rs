//! Show-context command implementation.
//!
//! Displays the resolved deployment context: identity, profile flags,
//! naming prefix, tags, and where the registry and binding store live.

use crate::error::CliError;
use crate::utils::{
    load_registry, resolve_data_directory, shorten_path, DeploymentArgs, GlobalOptions,
};
use clap::Args;
use stackplan::operations::ContextSummary;

/// Show the resolved deployment context.
#[derive(Args)]
pub struct ShowContextCommand {
    #[command(flatten)]
    pub deployment: DeploymentArgs,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

impl ShowContextCommand {
    /// Execute the show-context command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let (registry, source) = load_registry(global)?;
        let context = self.deployment.resolve(&registry)?;
        let data_dir = resolve_data_directory(global)?;
        let summary = ContextSummary::from(&context);

        if self.json {
            let value = serde_json::json!({
                "context": summary,
                "size_class": context.environment_profile().size_class.as_str(),
                "tags": context.tags(),
                "registry": source.to_string(),
                "data_dir": data_dir.display().to_string(),
            });
            let rendered = serde_json::to_string_pretty(&value)
                .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
            println!("{rendered}");
            return Ok(());
        }

        println!("{} {}", summary.app, summary.version);
        println!("  environment:  {}", summary.environment);
        println!(
            "  location:     {} ({})",
            summary.location, summary.location_display_name
        );
        println!("  production:   {}", summary.is_production);
        println!("  size class:   {}", context.environment_profile().size_class);
        println!("  stack prefix: {}", context.stack_name("").trim_end_matches('-'));
        println!("  registry:     {source}");
        println!("  data dir:     {}", shorten_path(&data_dir));
        println!("Tags:");
        for (key, value) in context.tags() {
            println!("  {key}={value}");
        }

        Ok(())
    }
}
