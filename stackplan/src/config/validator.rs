//! Registry validation.
//!
//! Every invariant the rest of the crate relies on is checked here, once, at
//! load time: identifiers keep generated names injective, exactly one
//! location is primary, and the topology references only things it declares.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::schema::{RegistryFile, TopologyConfig};
use crate::error::{Error, Result};

/// Longest identifier accepted anywhere in a registry.
const MAX_IDENTIFIER_LEN: usize = 63;

/// Validates registry files.
///
/// # Examples
///
/// ```
/// use stackplan::config::{RegistryFile, RegistryValidator, BUILTIN_REGISTRY};
///
/// let file: RegistryFile = serde_yaml::from_str(BUILTIN_REGISTRY).unwrap();
/// RegistryValidator::validate(&file).unwrap();
/// ```
pub struct RegistryValidator;

impl RegistryValidator {
    /// Validate a complete registry file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a malformed field and
    /// [`Error::InvalidRegistry`] when a cross-field invariant is broken.
    pub fn validate(file: &RegistryFile) -> Result<()> {
        Self::validate_name("app.name", &file.app.name)?;
        Self::validate_not_blank("app.version", &file.app.version)?;
        Self::validate_not_blank("app.owner", &file.app.owner)?;

        if file.environments.is_empty() {
            return Err(Error::InvalidRegistry {
                details: "at least one environment is required".into(),
            });
        }
        for (key, profile) in &file.environments {
            let field = format!("environments.{key}");
            Self::validate_segment(&field, key)?;
            Self::validate_key_matches(&field, key, &profile.id)?;
        }

        if file.locations.is_empty() {
            return Err(Error::InvalidRegistry {
                details: "at least one location is required".into(),
            });
        }
        let mut display_names = BTreeSet::new();
        for (key, location) in &file.locations {
            let field = format!("locations.{key}");
            Self::validate_name(&field, key)?;
            Self::validate_key_matches(&field, key, &location.id)?;
            Self::validate_segment(&format!("{field}.display_name"), &location.display_name)?;
            if location.zone_count == 0 {
                return Err(Error::Validation {
                    field: format!("{field}.zone_count"),
                    message: "must be at least 1".into(),
                });
            }
            if !display_names.insert(location.display_name.as_str()) {
                return Err(Error::InvalidRegistry {
                    details: format!(
                        "display name '{}' is used by more than one location",
                        location.display_name
                    ),
                });
            }
        }

        let primaries: Vec<&str> = file
            .locations
            .iter()
            .filter(|(_, l)| l.is_primary)
            .map(|(id, _)| id.as_str())
            .collect();
        if primaries.len() != 1 {
            return Err(Error::InvalidRegistry {
                details: format!(
                    "expected exactly one primary location, found {} ({})",
                    primaries.len(),
                    if primaries.is_empty() {
                        "none".to_string()
                    } else {
                        primaries.join(", ")
                    }
                ),
            });
        }

        if file.networking.private_cidr.prefix_len() == 0 {
            return Err(Error::Validation {
                field: "networking.private_cidr".into(),
                message: "the private range cannot cover every address".into(),
            });
        }

        Self::validate_not_blank("database.engine", &file.database.engine)?;
        Self::validate_not_blank("cache.engine", &file.cache.engine)?;

        let standard;
        let topology = match file.topology {
            Some(ref topology) => {
                Self::validate_topology(topology)?;
                topology
            }
            None => {
                standard = TopologyConfig::standard(&file.database, &file.cache);
                &standard
            }
        };
        let class_ids: BTreeSet<&str> = topology
            .traffic_classes
            .iter()
            .map(|c| c.id.as_str())
            .collect();

        for (environment, addresses) in &file.stable_addresses {
            if !file.environments.contains_key(environment) {
                return Err(Error::InvalidRegistry {
                    details: format!(
                        "stable addresses declared for unknown environment '{environment}'"
                    ),
                });
            }
            for (class, literal) in addresses {
                if !class_ids.contains(class.as_str()) {
                    return Err(Error::InvalidRegistry {
                        details: format!(
                            "stable address declared for unknown traffic class '{class}'"
                        ),
                    });
                }
                Self::validate_not_blank(
                    &format!("stable_addresses.{environment}.{class}.allocation_id"),
                    &literal.allocation_id,
                )?;
            }
        }

        Ok(())
    }

    /// Validate the provisioning topology.
    ///
    /// # Errors
    ///
    /// Returns an error when a unit, traffic class or service edge is
    /// duplicated or references something undeclared.
    pub fn validate_topology(topology: &TopologyConfig) -> Result<()> {
        let mut publishes: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for unit in &topology.units {
            Self::validate_name(&format!("topology.units.{}", unit.id), &unit.id)?;
            let outputs = unit.publishes.iter().map(String::as_str).collect();
            if publishes.insert(unit.id.as_str(), outputs).is_some() {
                return Err(Error::InvalidRegistry {
                    details: format!("unit '{}' is declared twice", unit.id),
                });
            }
        }

        for unit in &topology.units {
            for dependency in &unit.depends_on {
                if !publishes.contains_key(dependency.as_str()) {
                    return Err(Error::InvalidRegistry {
                        details: format!(
                            "unit '{}' depends on undeclared unit '{dependency}'",
                            unit.id
                        ),
                    });
                }
            }
            for input in &unit.consumes {
                let published = publishes.get(input.unit.as_str()).ok_or_else(|| {
                    Error::InvalidRegistry {
                        details: format!(
                            "unit '{}' consumes output of undeclared unit '{}'",
                            unit.id, input.unit
                        ),
                    }
                })?;
                if !published.contains(input.output.as_str()) {
                    return Err(Error::InvalidRegistry {
                        details: format!(
                            "unit '{}' consumes '{}.{}', which is never published",
                            unit.id, input.unit, input.output
                        ),
                    });
                }
            }
        }

        if !publishes.contains_key(topology.frontend_unit.as_str()) {
            return Err(Error::InvalidRegistry {
                details: format!("frontend unit '{}' is not declared", topology.frontend_unit),
            });
        }

        let mut ids = BTreeSet::new();
        let mut endpoints = BTreeSet::new();
        for class in &topology.traffic_classes {
            Self::validate_name(&format!("topology.traffic_classes.{}", class.id), &class.id)?;
            if !ids.insert(class.id.as_str()) {
                return Err(Error::InvalidRegistry {
                    details: format!("traffic class '{}' is declared twice", class.id),
                });
            }
            if !endpoints.insert((class.protocol, class.port)) {
                return Err(Error::InvalidRegistry {
                    details: format!(
                        "traffic class '{}' reuses {}/{}",
                        class.id, class.protocol, class.port
                    ),
                });
            }
        }

        for service in &topology.services {
            for unit in [&service.consumer, &service.provider] {
                if !publishes.contains_key(unit.as_str()) {
                    return Err(Error::InvalidRegistry {
                        details: format!(
                            "service '{}' references undeclared unit '{unit}'",
                            service.service
                        ),
                    });
                }
            }
            if service.consumer == service.provider {
                return Err(Error::InvalidRegistry {
                    details: format!(
                        "service '{}' has the same consumer and provider",
                        service.service
                    ),
                });
            }
        }

        Ok(())
    }

    /// Validate a name: lowercase alphanumerics and `-`, not starting or
    /// ending with `-`.
    pub(crate) fn validate_name(field: &str, value: &str) -> Result<()> {
        Self::validate_identifier(field, value, true)
    }

    /// Validate a name segment that is joined with `-` in generated names,
    /// so it may not contain `-` itself.
    pub(crate) fn validate_segment(field: &str, value: &str) -> Result<()> {
        Self::validate_identifier(field, value, false)
    }

    fn validate_identifier(field: &str, value: &str, allow_dash: bool) -> Result<()> {
        if value.is_empty() {
            return Err(Error::Validation {
                field: field.into(),
                message: "cannot be empty".into(),
            });
        }
        if value.len() > MAX_IDENTIFIER_LEN {
            return Err(Error::Validation {
                field: field.into(),
                message: format!("cannot exceed {MAX_IDENTIFIER_LEN} characters"),
            });
        }
        let valid_char =
            |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || (allow_dash && c == '-');
        if let Some(bad) = value.chars().find(|c| !valid_char(*c)) {
            return Err(Error::Validation {
                field: field.into(),
                message: format!("invalid character '{bad}' in '{value}'"),
            });
        }
        if value.starts_with('-') || value.ends_with('-') {
            return Err(Error::Validation {
                field: field.into(),
                message: "cannot start or end with '-'".into(),
            });
        }
        Ok(())
    }

    fn validate_not_blank(field: &str, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(Error::Validation {
                field: field.into(),
                message: "cannot be empty or only whitespace".into(),
            });
        }
        Ok(())
    }

    fn validate_key_matches(field: &str, key: &str, id: &str) -> Result<()> {
        if !id.is_empty() && id != key {
            return Err(Error::Validation {
                field: format!("{field}.id"),
                message: format!("id '{id}' does not match key '{key}'"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{OutputRef, UnitDefinition};
    use crate::config::BUILTIN_REGISTRY;
    use crate::network::{Exposure, Protocol, TrafficClass};
    use crate::port::Port;

    fn builtin() -> RegistryFile {
        serde_yaml::from_str(BUILTIN_REGISTRY).unwrap()
    }

    fn details(err: &Error) -> String {
        err.to_string()
    }

    #[test]
    fn test_builtin_registry_is_valid() {
        RegistryValidator::validate(&builtin()).unwrap();
    }

    #[test]
    fn test_no_primary_location_rejected() {
        let mut file = builtin();
        for location in file.locations.values_mut() {
            location.is_primary = false;
        }
        let err = RegistryValidator::validate(&file).unwrap_err();
        assert!(matches!(err, Error::InvalidRegistry { .. }));
        assert!(details(&err).contains("found 0 (none)"));
    }

    #[test]
    fn test_two_primary_locations_rejected() {
        let mut file = builtin();
        file.locations.get_mut("us-east-1").unwrap().is_primary = true;
        let err = RegistryValidator::validate(&file).unwrap_err();
        assert!(details(&err).contains("eu-west-1, us-east-1"));
    }

    #[test]
    fn test_zero_zones_rejected() {
        let mut file = builtin();
        file.locations.get_mut("us-east-1").unwrap().zone_count = 0;
        let err = RegistryValidator::validate(&file).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation { ref field, .. } if field == "locations.us-east-1.zone_count"
        ));
    }

    #[test]
    fn test_dash_in_environment_id_rejected() {
        let mut file = builtin();
        let profile = file.environments.remove("beta").unwrap();
        file.environments.insert("beta-two".into(), profile);
        assert!(RegistryValidator::validate(&file).is_err());
    }

    #[test]
    fn test_dash_in_display_name_rejected() {
        let mut file = builtin();
        file.locations.get_mut("us-east-1").unwrap().display_name = "north-virginia".into();
        assert!(RegistryValidator::validate(&file).is_err());
    }

    #[test]
    fn test_duplicate_display_name_rejected() {
        let mut file = builtin();
        file.locations.get_mut("us-east-1").unwrap().display_name = "ireland".into();
        let err = RegistryValidator::validate(&file).unwrap_err();
        assert!(details(&err).contains("more than one location"));
    }

    #[test]
    fn test_mismatched_explicit_id_rejected() {
        let mut file = builtin();
        file.environments.get_mut("beta").unwrap().id = "gamma".into();
        assert!(RegistryValidator::validate(&file).is_err());
    }

    #[test]
    fn test_identifier_rules() {
        assert!(RegistryValidator::validate_name("f", "streamr-p2p").is_ok());
        assert!(RegistryValidator::validate_name("f", "").is_err());
        assert!(RegistryValidator::validate_name("f", "Upper").is_err());
        assert!(RegistryValidator::validate_name("f", "-leading").is_err());
        assert!(RegistryValidator::validate_name("f", &"a".repeat(64)).is_err());
        assert!(RegistryValidator::validate_segment("f", "ireland").is_ok());
        assert!(RegistryValidator::validate_segment("f", "eu-west").is_err());
    }

    #[test]
    fn test_duplicate_traffic_endpoint_rejected() {
        let mut file = builtin();
        let mut topology = crate::config::TopologyConfig::standard(&file.database, &file.cache);
        topology.traffic_classes.push(TrafficClass::new(
            "admin-ui",
            Protocol::Http,
            Port::HTTP,
            false,
            Exposure::Internal,
        ));
        file.topology = Some(topology);
        let err = RegistryValidator::validate(&file).unwrap_err();
        assert!(details(&err).contains("reuses HTTP/80"));
    }

    #[test]
    fn test_unpublished_output_rejected() {
        let file = builtin();
        let mut topology = crate::config::TopologyConfig::standard(&file.database, &file.cache);
        topology.units.push(UnitDefinition {
            id: "monitoring".into(),
            description: String::new(),
            depends_on: vec!["foundation".into()],
            consumes: vec![OutputRef::new("foundation", "grafana-url")],
            publishes: Vec::new(),
        });
        let err = RegistryValidator::validate_topology(&topology).unwrap_err();
        assert!(details(&err).contains("foundation.grafana-url"));
    }

    #[test]
    fn test_undeclared_dependency_rejected() {
        let file = builtin();
        let mut topology = crate::config::TopologyConfig::standard(&file.database, &file.cache);
        topology.units[1].depends_on.push("edge".into());
        assert!(RegistryValidator::validate_topology(&topology).is_err());
    }

    #[test]
    fn test_stable_address_for_unknown_class_rejected() {
        let yaml = format!(
            "{BUILTIN_REGISTRY}\nstable_addresses:\n  production:\n    mystery:\n      \
             address: 203.0.113.10\n      allocation_id: eipalloc-1\n"
        );
        let file: RegistryFile = serde_yaml::from_str(&yaml).unwrap();
        let err = RegistryValidator::validate(&file).unwrap_err();
        assert!(details(&err).contains("mystery"));
    }
}
