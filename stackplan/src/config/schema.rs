//! Registry file schema.
//!
//! A registry file is a YAML document declaring the application, its
//! environments and locations, the shared network and data services, and
//! optionally the provisioning topology and pre-existing stable addresses.

use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

use crate::network::{ServiceDependency, TrafficClass};

/// Complete registry file.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RegistryFile {
    /// Application identity, used in every generated name and tag.
    pub app: AppConfig,

    /// Environment profiles keyed by identifier.
    pub environments: BTreeMap<String, EnvironmentProfile>,

    /// Location profiles keyed by identifier.
    pub locations: BTreeMap<String, LocationProfile>,

    /// Shared network settings.
    pub networking: NetworkingConfig,

    /// Relational database settings.
    pub database: DataServiceConfig,

    /// Cache settings.
    pub cache: DataServiceConfig,

    /// Provisioning topology; the standard one is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology: Option<TopologyConfig>,

    /// Pre-existing stable addresses, keyed by environment then traffic class.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub stable_addresses: BTreeMap<String, BTreeMap<String, LiteralAddress>>,
}

/// Application identity.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Application name; the first segment of every generated name.
    pub name: String,
    /// Application version.
    pub version: String,
    /// Owning team, emitted as the `Owner` tag.
    pub owner: String,
}

/// Instance size class of an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    /// Smallest footprint.
    Micro,
    /// Small.
    Small,
    /// Medium.
    Medium,
    /// Large.
    Large,
}

impl SizeClass {
    /// Lowercase name used inside instance type identifiers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Micro => "micro",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monitoring posture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MonitoringProfile {
    /// Detailed (one-minute) metrics.
    #[serde(default)]
    pub detailed: bool,
    /// Alarms wired up.
    #[serde(default)]
    pub alarms_enabled: bool,
}

/// A deployment environment and its posture.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentProfile {
    /// Identifier; filled from the registry key when omitted.
    #[serde(default)]
    pub id: String,
    /// Human description.
    pub description: String,
    /// Production trust level.
    #[serde(default)]
    pub is_production: bool,
    /// Stateful resources refuse deletion.
    #[serde(default)]
    pub deletion_protected: bool,
    /// Automated backups are kept.
    #[serde(default)]
    pub backups_enabled: bool,
    /// Instance size class.
    pub size_class: SizeClass,
    /// Data services span several zones.
    #[serde(default)]
    pub multi_zone: bool,
    /// Monitoring posture.
    #[serde(default)]
    pub monitoring: MonitoringProfile,
}

/// A deployment location (region).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LocationProfile {
    /// Identifier; filled from the registry key when omitted.
    #[serde(default)]
    pub id: String,
    /// Short display name used in stack names, e.g. `ireland`.
    pub display_name: String,
    /// Whether this is the default location.
    #[serde(default)]
    pub is_primary: bool,
    /// Number of availability zones to spread across.
    pub zone_count: u32,
}

/// Shared network settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NetworkingConfig {
    /// The deployment's private address range.
    pub private_cidr: Ipv4Net,
    /// Whether private subnets get a NAT gateway.
    #[serde(default)]
    pub nat_gateway: bool,
}

/// A managed data service (database or cache).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DataServiceConfig {
    /// Engine name, e.g. `postgres`.
    pub engine: String,
    /// Engine version, when pinned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Service port.
    pub port: crate::port::Port,
}

/// A reference to an output published by another unit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OutputRef {
    /// Publishing unit.
    pub unit: String,
    /// Output name.
    pub output: String,
}

impl OutputRef {
    /// Creates an output reference.
    #[must_use]
    pub fn new(unit: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            output: output.into(),
        }
    }
}

/// One provisioning unit in the topology.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct UnitDefinition {
    /// Unit identifier, also the stack name suffix.
    pub id: String,
    /// Human description.
    #[serde(default)]
    pub description: String,
    /// Units that must be applied first.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Outputs of other units this unit reads.
    #[serde(default)]
    pub consumes: Vec<OutputRef>,
    /// Outputs this unit publishes.
    #[serde(default)]
    pub publishes: Vec<String>,
}

/// Provisioning topology: units, exposed traffic and service edges.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TopologyConfig {
    /// Unit that receives the traffic-class ingress rules.
    pub frontend_unit: String,
    /// Provisioning units.
    pub units: Vec<UnitDefinition>,
    /// Exposed traffic classes.
    pub traffic_classes: Vec<TrafficClass>,
    /// Service dependency edges between units.
    #[serde(default)]
    pub services: Vec<ServiceDependency>,
}

const FOUNDATION: &str = "foundation";
const APPLICATION: &str = "application";

impl TopologyConfig {
    /// The standard two-unit topology: a foundation unit owning network and
    /// data services, and an application unit fronting all traffic.
    #[must_use]
    pub fn standard(database: &DataServiceConfig, cache: &DataServiceConfig) -> Self {
        let foundation_outputs = [
            "vpc-id",
            "db-endpoint",
            "db-port",
            "db-secret-arn",
            "cache-endpoint",
            "cache-port",
            "deployment-bucket",
            "ecr-repository-uri",
            "ecs-cluster-name",
        ];
        let consumed = [
            "vpc-id",
            "db-endpoint",
            "db-port",
            "db-secret-arn",
            "cache-endpoint",
            "cache-port",
            "deployment-bucket",
        ];

        Self {
            frontend_unit: APPLICATION.to_string(),
            units: vec![
                UnitDefinition {
                    id: FOUNDATION.to_string(),
                    description:
                        "Network, database, cache, artifact store, container registry and cluster"
                            .to_string(),
                    depends_on: Vec::new(),
                    consumes: Vec::new(),
                    publishes: foundation_outputs.iter().map(ToString::to_string).collect(),
                },
                UnitDefinition {
                    id: APPLICATION.to_string(),
                    description: "Compute, shared HTTP layer and dedicated stateful layer"
                        .to_string(),
                    depends_on: vec![FOUNDATION.to_string()],
                    consumes: consumed
                        .iter()
                        .map(|name| OutputRef::new(FOUNDATION, *name))
                        .collect(),
                    publishes: vec![
                        "alb-dns".to_string(),
                        "instance-id".to_string(),
                        "streaming-endpoint".to_string(),
                    ],
                },
            ],
            traffic_classes: TrafficClass::standard(),
            services: vec![
                ServiceDependency::new(APPLICATION, FOUNDATION, "database", database.port),
                ServiceDependency::new(APPLICATION, FOUNDATION, "cache", cache.port),
            ],
        }
    }

    /// Looks up a unit by id.
    #[must_use]
    pub fn unit(&self, id: &str) -> Option<&UnitDefinition> {
        self.units.iter().find(|u| u.id == id)
    }
}

/// A stable address that existed before the binding store did.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LiteralAddress {
    /// The public address.
    pub address: Ipv4Addr,
    /// Provider-side allocation identifier.
    pub allocation_id: String,
}
