//! Resource sizing derived from the environment and location profiles.

use std::fmt;

use serde::Serialize;

use crate::context::DeploymentContext;

/// Database storage for production environments, in GB.
pub const PRODUCTION_STORAGE_GB: u32 = 100;

/// Database storage for every other environment, in GB.
pub const DEFAULT_STORAGE_GB: u32 = 20;

/// Detailed monitoring sample interval, in seconds.
pub const DETAILED_MONITORING_INTERVAL_SECS: u32 = 60;

/// What happens to stateful resources when their unit is torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RemovalPolicy {
    /// Keep the resource.
    Retain,
    /// Delete the resource with its unit.
    Destroy,
}

impl fmt::Display for RemovalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retain => write!(f, "retain"),
            Self::Destroy => write!(f, "destroy"),
        }
    }
}

/// Concrete sizes and protections for one deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceSizing {
    /// Compute instance type.
    pub instance_type: String,
    /// Cache node type.
    pub cache_node_type: String,
    /// Allocated database storage, in GB.
    pub database_storage_gb: u32,
    /// Days of automated backups to keep; 0 disables them.
    pub backup_retention_days: u32,
    /// Teardown behavior for stateful resources.
    pub removal_policy: RemovalPolicy,
    /// Whether stateful resources refuse deletion.
    pub deletion_protection: bool,
    /// Whether data services span several zones.
    pub multi_zone: bool,
    /// Monitoring interval when detailed monitoring is on.
    pub monitoring_interval_secs: Option<u32>,
    /// Whether alarms are created.
    pub alarms_enabled: bool,
    /// Zones available in the location.
    pub zone_count: u32,
}

impl ResourceSizing {
    /// Derives sizing from a resolved context.
    ///
    /// # Examples
    ///
    /// ```
    /// use stackplan::{ConfigRegistry, DeploymentContext};
    /// use stackplan::operations::{RemovalPolicy, ResourceSizing};
    ///
    /// let registry = ConfigRegistry::builtin().unwrap();
    /// let context = DeploymentContext::resolve(&registry, "production", "eu-west-1").unwrap();
    /// let sizing = ResourceSizing::derive(&context);
    /// assert_eq!(sizing.instance_type, "t3.medium");
    /// assert_eq!(sizing.removal_policy, RemovalPolicy::Retain);
    /// ```
    #[must_use]
    pub fn derive(context: &DeploymentContext) -> Self {
        let env = context.environment_profile();
        let size = env.size_class.as_str();

        let (database_storage_gb, removal_policy) = if env.is_production {
            (PRODUCTION_STORAGE_GB, RemovalPolicy::Retain)
        } else {
            (DEFAULT_STORAGE_GB, RemovalPolicy::Destroy)
        };

        let backup_retention_days = match (env.is_production, env.backups_enabled) {
            (_, false) => 0,
            (true, true) => 30,
            (false, true) => 7,
        };

        Self {
            instance_type: format!("t3.{size}"),
            cache_node_type: format!("cache.t4g.{size}"),
            database_storage_gb,
            backup_retention_days,
            removal_policy,
            deletion_protection: env.deletion_protected,
            multi_zone: env.multi_zone,
            monitoring_interval_secs: env
                .monitoring
                .detailed
                .then_some(DETAILED_MONITORING_INTERVAL_SECS),
            alarms_enabled: env.monitoring.alarms_enabled,
            zone_count: context.location_profile().zone_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::registry::BUILTIN_REGISTRY;
    use crate::config::ConfigRegistry;

    fn sizing(environment: &str, location: &str) -> ResourceSizing {
        let registry = ConfigRegistry::builtin().unwrap();
        let context = DeploymentContext::resolve(&registry, environment, location).unwrap();
        ResourceSizing::derive(&context)
    }

    #[test]
    fn test_beta_is_minimal() {
        let s = sizing("beta", "eu-west-1");
        assert_eq!(s.instance_type, "t3.micro");
        assert_eq!(s.cache_node_type, "cache.t4g.micro");
        assert_eq!(s.database_storage_gb, 20);
        assert_eq!(s.backup_retention_days, 0);
        assert_eq!(s.removal_policy, RemovalPolicy::Destroy);
        assert!(!s.deletion_protection);
        assert!(!s.multi_zone);
        assert_eq!(s.monitoring_interval_secs, None);
        assert!(!s.alarms_enabled);
        assert_eq!(s.zone_count, 2);
    }

    #[test]
    fn test_staging_keeps_backups_without_production_storage() {
        let s = sizing("staging", "us-east-1");
        assert_eq!(s.instance_type, "t3.small");
        assert_eq!(s.database_storage_gb, 20);
        assert_eq!(s.backup_retention_days, 7);
        assert!(s.deletion_protection);
        assert_eq!(s.monitoring_interval_secs, Some(60));
        assert!(s.alarms_enabled);
        assert_eq!(s.zone_count, 3);
    }

    #[test]
    fn test_production_is_protected() {
        let s = sizing("production", "ap-southeast-1");
        assert_eq!(s.instance_type, "t3.medium");
        assert_eq!(s.database_storage_gb, 100);
        assert_eq!(s.backup_retention_days, 30);
        assert_eq!(s.removal_policy, RemovalPolicy::Retain);
        assert!(s.multi_zone);
    }

    #[test]
    fn test_disabled_backups_keep_nothing_even_in_production() {
        let yaml = BUILTIN_REGISTRY.replacen(
            "is_production: true\n    deletion_protected: true\n    backups_enabled: true",
            "is_production: true\n    deletion_protected: true\n    backups_enabled: false",
            1,
        );
        assert_ne!(yaml, BUILTIN_REGISTRY);
        let registry = ConfigRegistry::from_yaml(&yaml).unwrap();
        let context = DeploymentContext::resolve(&registry, "production", "eu-west-1").unwrap();

        let s = ResourceSizing::derive(&context);
        assert_eq!(s.backup_retention_days, 0);
        assert_eq!(s.removal_policy, RemovalPolicy::Retain);
    }
}
