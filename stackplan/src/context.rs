//! Deployment context resolution and naming.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::{ConfigRegistry, EnvironmentProfile, InvocationInputs, LocationProfile};
use crate::error::Result;

/// Tag value identifying the tool that manages the resources.
pub const MANAGED_BY: &str = "stackplan";

/// The validated (environment, location) pair for one run.
///
/// Construction validates both ids against the registry, so every context
/// that exists refers to registered profiles.
///
/// # Examples
///
/// ```
/// use stackplan::{ConfigRegistry, DeploymentContext};
///
/// let registry = ConfigRegistry::builtin().unwrap();
/// let context = DeploymentContext::resolve(&registry, "staging", "us-east-1").unwrap();
/// assert_eq!(context.stack_name("foundation"), "streamr-p2p-staging-virginia-foundation");
/// assert_eq!(context.resource_name("db"), "streamr-p2p-staging-db");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentContext {
    app_name: String,
    app_version: String,
    owner: String,
    environment_profile: EnvironmentProfile,
    location_profile: LocationProfile,
}

impl DeploymentContext {
    /// Resolve a context, failing fast on unknown ids.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnknownEnvironment`] or
    /// [`crate::Error::UnknownLocation`], each listing all valid ids.
    pub fn resolve(registry: &ConfigRegistry, environment: &str, location: &str) -> Result<Self> {
        let environment_profile = registry.lookup_environment(environment)?.clone();
        let location_profile = registry.lookup_location(location)?.clone();
        let app = registry.app();

        log::info!(
            "resolved context {}/{} ({})",
            environment_profile.id,
            location_profile.id,
            location_profile.display_name
        );

        Ok(Self {
            app_name: app.name.clone(),
            app_version: app.version.clone(),
            owner: app.owner.clone(),
            environment_profile,
            location_profile,
        })
    }

    /// Resolve a context from invocation inputs.
    ///
    /// # Errors
    ///
    /// See [`DeploymentContext::resolve`].
    pub fn from_inputs(registry: &ConfigRegistry, inputs: &InvocationInputs) -> Result<Self> {
        Self::resolve(registry, &inputs.environment, &inputs.location)
    }

    /// Environment id.
    #[must_use]
    pub fn environment(&self) -> &str {
        &self.environment_profile.id
    }

    /// Location id.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location_profile.id
    }

    /// Application name.
    #[must_use]
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Application version.
    #[must_use]
    pub fn app_version(&self) -> &str {
        &self.app_version
    }

    /// The resolved environment profile.
    #[must_use]
    pub const fn environment_profile(&self) -> &EnvironmentProfile {
        &self.environment_profile
    }

    /// The resolved location profile.
    #[must_use]
    pub const fn location_profile(&self) -> &LocationProfile {
        &self.location_profile
    }

    /// Whether this run targets a production environment.
    #[must_use]
    pub const fn is_production(&self) -> bool {
        self.environment_profile.is_production
    }

    /// `<app>-<environment>-<location display name>-<suffix>`.
    #[must_use]
    pub fn stack_name(&self, suffix: &str) -> String {
        format!(
            "{}-{}-{}-{suffix}",
            self.app_name, self.environment_profile.id, self.location_profile.display_name
        )
    }

    /// `<app>-<environment>-<name>`.
    #[must_use]
    pub fn resource_name(&self, name: &str) -> String {
        format!("{}-{}-{name}", self.app_name, self.environment_profile.id)
    }

    /// Standard tags applied to every resource.
    #[must_use]
    pub fn tags(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("ManagedBy".to_string(), MANAGED_BY.to_string()),
            ("Owner".to_string(), self.owner.clone()),
            ("Project".to_string(), self.app_name.clone()),
            ("Region".to_string(), self.location_profile.id.clone()),
            ("Stage".to_string(), self.environment_profile.id.clone()),
        ])
    }
}
