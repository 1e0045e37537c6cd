//! Output formatting for deployment plans and stable address bindings.
//!
//! Plans render as human-readable text, JSON or YAML. Every format is
//! deterministic for a given plan, so output can be diffed across runs.

mod formatters;

use crate::binding::StableAddressBinding;
use crate::operations::DeploymentPlan;
use crate::Result;

pub use formatters::{JsonFormatter, TextFormatter, YamlFormatter};

/// Trait for rendering plans and bindings.
pub trait OutputFormatter {
    /// Render a deployment plan.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn format_plan(&self, plan: &DeploymentPlan) -> Result<String>;

    /// Render a list of bindings.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn format_bindings(&self, bindings: &[StableAddressBinding]) -> Result<String>;
}

/// Available output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
    /// YAML.
    Yaml,
}

impl OutputFormat {
    /// Create a formatter for this output format.
    #[must_use]
    pub fn create_formatter(self) -> Box<dyn OutputFormatter> {
        match self {
            Self::Text => Box::new(TextFormatter),
            Self::Json => Box::new(JsonFormatter),
            Self::Yaml => Box::new(YamlFormatter),
        }
    }
}
