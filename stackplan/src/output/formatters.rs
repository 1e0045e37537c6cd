//! Output formatter implementations.

use std::time::SystemTime;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::binding::StableAddressBinding;
use crate::operations::DeploymentPlan;
use crate::{Error, Result};

use super::OutputFormatter;

fn timestamp(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Serializable view of a binding with its timestamps.
#[derive(Serialize)]
struct BindingRecord<'a> {
    environment: &'a str,
    location: &'a str,
    traffic_class: &'a str,
    address: String,
    allocation_id: &'a str,
    bound_resource_id: Option<&'a str>,
    state: &'static str,
    created_at: String,
    updated_at: String,
}

impl<'a> From<&'a StableAddressBinding> for BindingRecord<'a> {
    fn from(binding: &'a StableAddressBinding) -> Self {
        Self {
            environment: &binding.key.environment,
            location: &binding.key.location,
            traffic_class: &binding.key.traffic_class,
            address: binding.address.address.to_string(),
            allocation_id: &binding.address.allocation_id,
            bound_resource_id: binding.bound_resource_id.as_deref(),
            state: binding.state.as_str(),
            created_at: timestamp(binding.created_at),
            updated_at: timestamp(binding.updated_at),
        }
    }
}

fn records(bindings: &[StableAddressBinding]) -> Vec<BindingRecord<'_>> {
    bindings.iter().map(BindingRecord::from).collect()
}

/// Formatter for human-readable output.
pub struct TextFormatter;

impl OutputFormatter for TextFormatter {
    fn format_plan(&self, plan: &DeploymentPlan) -> Result<String> {
        let ctx = &plan.context;
        let sizing = &plan.sizing;
        let mut lines = vec![
            format!("Deployment plan for {} {}", ctx.app, ctx.version),
            format!(
                "  environment: {}{}",
                ctx.environment,
                if ctx.is_production { " (production)" } else { "" }
            ),
            format!("  location:    {} ({})", ctx.location, ctx.location_display_name),
            String::new(),
            "Sizing:".to_string(),
            format!("  instance type:     {}", sizing.instance_type),
            format!("  cache node type:   {}", sizing.cache_node_type),
            format!("  database storage:  {} GB", sizing.database_storage_gb),
            format!("  backup retention:  {} days", sizing.backup_retention_days),
            format!("  removal policy:    {}", sizing.removal_policy),
            format!("  deletion protect:  {}", sizing.deletion_protection),
            format!(
                "  multi-zone:        {} ({} zones available)",
                sizing.multi_zone, sizing.zone_count
            ),
            format!(
                "  monitoring:        {}",
                sizing
                    .monitoring_interval_secs
                    .map_or_else(|| "basic".to_string(), |secs| format!("detailed every {secs}s"))
            ),
            format!("  alarms:            {}", sizing.alarms_enabled),
            String::new(),
            "Tags:".to_string(),
        ];
        lines.extend(plan.tags.iter().map(|(k, v)| format!("  {k}={v}")));

        lines.push(String::new());
        lines.push("Units (apply order):".to_string());
        for (i, unit) in plan.units.iter().enumerate() {
            lines.push(format!("  {}. {} -> {}", i + 1, unit.id, unit.stack_name));
            if !unit.description.is_empty() {
                lines.push(format!("     {}", unit.description));
            }
            if !unit.depends_on.is_empty() {
                lines.push(format!("     depends on: {}", unit.depends_on.join(", ")));
            }
            if !unit.rules.is_empty() {
                lines.push("     rules:".to_string());
                lines.extend(unit.rules.iter().map(|r| format!("       {r}")));
            }
            if !unit.routing.is_empty() {
                lines.push("     routing:".to_string());
                for assignment in &unit.routing {
                    let stable = if assignment.stable_address_required {
                        " (stable address)"
                    } else {
                        ""
                    };
                    lines.push(format!(
                        "       {}: {}{stable}",
                        assignment.traffic_class_id, assignment.mechanism
                    ));
                }
            }
            if !unit.inputs.is_empty() {
                lines.push("     inputs:".to_string());
                lines.extend(
                    unit.inputs
                        .iter()
                        .map(|h| format!("       {h} ({})", h.export_name)),
                );
            }
            if !unit.outputs.is_empty() {
                lines.push("     outputs:".to_string());
                lines.extend(
                    unit.outputs
                        .iter()
                        .map(|h| format!("       {} ({})", h.output, h.export_name)),
                );
            }
            if !unit.binding_actions.is_empty() {
                lines.push("     stable addresses:".to_string());
                lines.extend(
                    unit.binding_actions
                        .iter()
                        .map(|a| format!("       {}", a.description())),
                );
            }
        }

        if !plan.warnings.is_empty() {
            lines.push(String::new());
            lines.push("Warnings:".to_string());
            lines.extend(plan.warnings.iter().map(|w| format!("  - {w}")));
        }

        Ok(lines.join("\n"))
    }

    fn format_bindings(&self, bindings: &[StableAddressBinding]) -> Result<String> {
        if bindings.is_empty() {
            return Ok("No stable address bindings.".to_string());
        }

        let mut lines = vec!["Stable address bindings:".to_string()];
        for binding in bindings {
            lines.push(format!(
                "  {}: {} [{}] {} (updated {})",
                binding.key,
                binding.address,
                binding.state,
                binding.bound_resource_id.as_deref().unwrap_or("-"),
                timestamp(binding.updated_at)
            ));
        }
        Ok(lines.join("\n"))
    }
}

/// Formatter for JSON output.
pub struct JsonFormatter;

impl JsonFormatter {
    fn render<T: Serialize + ?Sized>(value: &T) -> Result<String> {
        serde_json::to_string_pretty(value).map_err(|e| Error::Validation {
            field: "json_output".to_string(),
            message: format!("failed to serialize to JSON: {e}"),
        })
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_plan(&self, plan: &DeploymentPlan) -> Result<String> {
        Self::render(plan)
    }

    fn format_bindings(&self, bindings: &[StableAddressBinding]) -> Result<String> {
        Self::render(&records(bindings))
    }
}

/// Formatter for YAML output.
pub struct YamlFormatter;

impl OutputFormatter for YamlFormatter {
    fn format_plan(&self, plan: &DeploymentPlan) -> Result<String> {
        Ok(serde_yaml::to_string(plan)?)
    }

    fn format_bindings(&self, bindings: &[StableAddressBinding]) -> Result<String> {
        Ok(serde_yaml::to_string(&records(bindings))?)
    }
}
