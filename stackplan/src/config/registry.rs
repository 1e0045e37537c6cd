//! The immutable environment and location registry.

use std::collections::BTreeMap;

use crate::config::schema::{
    AppConfig, DataServiceConfig, EnvironmentProfile, LiteralAddress, LocationProfile,
    NetworkingConfig, RegistryFile, TopologyConfig,
};
use crate::config::validator::RegistryValidator;
use crate::error::{Error, Result};

/// Built-in registry definition, used when no registry file is found.
pub const BUILTIN_REGISTRY: &str = include_str!("builtin.yaml");

/// Validated, read-only table of environment and location profiles.
///
/// A registry can only be built through validation, so every instance
/// holds exactly one primary location and well-formed identifiers. It is
/// plain data and can be shared across threads for concurrent lookups.
///
/// # Examples
///
/// ```
/// use stackplan::ConfigRegistry;
///
/// let registry = ConfigRegistry::builtin().unwrap();
/// let prod = registry.lookup_environment("production").unwrap();
/// assert!(prod.is_production);
/// assert_eq!(registry.primary_location().unwrap().id, "eu-west-1");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigRegistry {
    app: AppConfig,
    environments: BTreeMap<String, EnvironmentProfile>,
    locations: BTreeMap<String, LocationProfile>,
    networking: NetworkingConfig,
    database: DataServiceConfig,
    cache: DataServiceConfig,
    topology: TopologyConfig,
    stable_addresses: BTreeMap<String, BTreeMap<String, LiteralAddress>>,
}

impl ConfigRegistry {
    /// Validates a registry file and builds the registry from it.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file breaks any registry
    /// invariant.
    pub fn from_file(file: RegistryFile) -> Result<Self> {
        RegistryValidator::validate(&file)?;

        let RegistryFile {
            app,
            mut environments,
            mut locations,
            networking,
            database,
            cache,
            topology,
            stable_addresses,
        } = file;

        for (id, profile) in &mut environments {
            profile.id.clone_from(id);
        }
        for (id, profile) in &mut locations {
            profile.id.clone_from(id);
        }
        let topology = topology.unwrap_or_else(|| TopologyConfig::standard(&database, &cache));

        log::debug!(
            "registry loaded: {} environments, {} locations, {} traffic classes",
            environments.len(),
            locations.len(),
            topology.traffic_classes.len()
        );

        Ok(Self {
            app,
            environments,
            locations,
            networking,
            database,
            cache,
            topology,
            stable_addresses,
        })
    }

    /// Parses and validates a registry from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or the registry is invalid.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: RegistryFile = serde_yaml::from_str(yaml)?;
        Self::from_file(file)
    }

    /// The built-in registry.
    ///
    /// # Errors
    ///
    /// Only fails if the embedded definition itself is broken.
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_REGISTRY)
    }

    /// Looks up an environment profile.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownEnvironment`] listing every valid id.
    pub fn lookup_environment(&self, id: &str) -> Result<&EnvironmentProfile> {
        self.environments
            .get(id)
            .ok_or_else(|| Error::UnknownEnvironment {
                value: id.to_string(),
                valid: self.environment_ids(),
            })
    }

    /// Looks up a location profile.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownLocation`] listing every valid id.
    pub fn lookup_location(&self, id: &str) -> Result<&LocationProfile> {
        self.locations.get(id).ok_or_else(|| Error::UnknownLocation {
            value: id.to_string(),
            valid: self.location_ids(),
        })
    }

    /// All environment profiles, ordered by id.
    #[must_use]
    pub fn list_environments(&self) -> Vec<&EnvironmentProfile> {
        self.environments.values().collect()
    }

    /// All location profiles, ordered by id.
    #[must_use]
    pub fn list_locations(&self) -> Vec<&LocationProfile> {
        self.locations.values().collect()
    }

    /// All environment ids, ordered.
    #[must_use]
    pub fn environment_ids(&self) -> Vec<String> {
        self.environments.keys().cloned().collect()
    }

    /// All location ids, ordered.
    #[must_use]
    pub fn location_ids(&self) -> Vec<String> {
        self.locations.keys().cloned().collect()
    }

    /// The location flagged as primary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoPrimaryLocation`] if none is flagged. A validated
    /// registry always has one, but the default is never assumed silently.
    pub fn primary_location(&self) -> Result<&LocationProfile> {
        self.locations
            .values()
            .find(|l| l.is_primary)
            .ok_or(Error::NoPrimaryLocation)
    }

    /// Application identity.
    #[must_use]
    pub const fn app(&self) -> &AppConfig {
        &self.app
    }

    /// Shared network settings.
    #[must_use]
    pub const fn networking(&self) -> &NetworkingConfig {
        &self.networking
    }

    /// Database settings.
    #[must_use]
    pub const fn database(&self) -> &DataServiceConfig {
        &self.database
    }

    /// Cache settings.
    #[must_use]
    pub const fn cache(&self) -> &DataServiceConfig {
        &self.cache
    }

    /// The provisioning topology, standard unless the file declared one.
    #[must_use]
    pub const fn topology(&self) -> &TopologyConfig {
        &self.topology
    }

    /// Literal stable addresses declared for an environment, by traffic class.
    #[must_use]
    pub fn literal_addresses(
        &self,
        environment: &str,
    ) -> Option<&BTreeMap<String, LiteralAddress>> {
        self.stable_addresses.get(environment)
    }
}
