//! Invocation inputs: environment and location selection.
//!
//! Each input comes from a command-line flag, else an environment variable,
//! else a fixed default: `beta` for the environment and the registry's
//! primary location for the location.

use std::env;

use crate::config::registry::ConfigRegistry;
use crate::error::{Error, Result};

/// Environment variable selecting the deployment environment.
pub const ENVIRONMENT_ENV: &str = "STACKPLAN_ENVIRONMENT";

/// Environment variable selecting the deployment location.
pub const LOCATION_ENV: &str = "STACKPLAN_LOCATION";

/// Environment used when neither flag nor variable is set.
pub const DEFAULT_ENVIRONMENT: &str = "beta";

/// Where an invocation input came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    /// A command-line flag.
    Flag,
    /// An environment variable.
    Environment,
    /// The fixed default.
    Default,
}

/// The environment and location ids selected for one run.
///
/// The ids are not validated here; the context resolver does that so the
/// error can enumerate every valid id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationInputs {
    /// Selected environment id.
    pub environment: String,
    /// Where the environment id came from.
    pub environment_source: InputSource,
    /// Selected location id.
    pub location: String,
    /// Where the location id came from.
    pub location_source: InputSource,
}

impl InvocationInputs {
    /// Resolve the inputs for this invocation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoPrimaryLocation`] if the location falls back to a
    /// default and the registry has no primary location, and
    /// [`Error::Validation`] if a variable is set but not valid unicode.
    pub fn resolve(
        registry: &ConfigRegistry,
        environment_flag: Option<&str>,
        location_flag: Option<&str>,
    ) -> Result<Self> {
        let picked = Self::pick(environment_flag, ENVIRONMENT_ENV)?;
        let (environment, environment_source) = match picked {
            Some(found) => found,
            None => (DEFAULT_ENVIRONMENT.to_string(), InputSource::Default),
        };

        let (location, location_source) = match Self::pick(location_flag, LOCATION_ENV)? {
            Some(found) => found,
            None => (registry.primary_location()?.id.clone(), InputSource::Default),
        };

        log::debug!(
            "invocation inputs: environment '{environment}' ({environment_source:?}), \
             location '{location}' ({location_source:?})"
        );

        Ok(Self {
            environment,
            environment_source,
            location,
            location_source,
        })
    }

    fn pick(flag: Option<&str>, variable: &str) -> Result<Option<(String, InputSource)>> {
        if let Some(value) = flag.map(str::trim).filter(|v| !v.is_empty()) {
            return Ok(Some((value.to_string(), InputSource::Flag)));
        }
        match env::var(variable) {
            Ok(value) if !value.trim().is_empty() => {
                Ok(Some((value.trim().to_string(), InputSource::Environment)))
            }
            Ok(_) | Err(env::VarError::NotPresent) => Ok(None),
            Err(env::VarError::NotUnicode(_)) => Err(Error::Validation {
                field: variable.into(),
                message: "value is not valid unicode".into(),
            }),
        }
    }
}
