//! Error types for the stackplan library.
//!
//! This module provides the error hierarchy for every planning and binding
//! operation, using `thiserror` for ergonomic error handling. Each variant
//! belongs to one [`ErrorCategory`], which is what operators and the CLI
//! reason about.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for operations that may fail with a stackplan error.
///
/// # Examples
///
/// ```
/// use stackplan::{Error, Result};
///
/// fn example_operation() -> Result<u16> {
///     Ok(1935)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the stackplan library.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested environment is not in the registry.
    #[error("unknown environment '{value}'; valid environments: {}", .valid.join(", "))]
    UnknownEnvironment {
        /// The identifier that was requested.
        value: String,
        /// Every identifier the registry knows about.
        valid: Vec<String>,
    },

    /// The requested location is not in the registry.
    #[error("unknown location '{value}'; valid locations: {}", .valid.join(", "))]
    UnknownLocation {
        /// The identifier that was requested.
        value: String,
        /// Every identifier the registry knows about.
        valid: Vec<String>,
    },

    /// No location is flagged as primary.
    #[error("no primary location configured")]
    NoPrimaryLocation,

    /// The registry definition breaks one of its load-time invariants.
    #[error("invalid registry: {details}")]
    InvalidRegistry {
        /// What is wrong with the registry.
        details: String,
    },

    /// A rule was requested that the environment's trust level forbids.
    #[error("policy violation in environment '{environment}': {details}")]
    PolicyViolation {
        /// The environment the request was made for.
        environment: String,
        /// Why the request was refused.
        details: String,
    },

    /// The provisioning units form a cycle.
    #[error("cyclic dependency: {}", format_cycle(.cycle))]
    CyclicDependency {
        /// The node ids along the cycle, starting at the smallest id.
        cycle: Vec<String>,
    },

    /// A node depends on an id that was never added to the graph.
    #[error("node '{node}' depends on unknown node '{dependency}'")]
    UnknownDependency {
        /// The node declaring the dependency.
        node: String,
        /// The missing dependency.
        dependency: String,
    },

    /// The same node id was added twice.
    #[error("duplicate node '{id}'")]
    DuplicateNode {
        /// The repeated id.
        id: String,
    },

    /// A binding was requested for a traffic class that already has a
    /// different active binding.
    #[error(
        "address binding conflict for '{traffic_class}': already bound to {existing}, refusing {requested}"
    )]
    AddressBindingConflict {
        /// The traffic class the binding belongs to.
        traffic_class: String,
        /// The address of the active binding.
        existing: String,
        /// The address that was requested.
        requested: String,
    },

    /// An optimistic check against the stored binding failed, usually
    /// because another deployment run re-pointed it first.
    #[error(
        "stale binding for '{traffic_class}': expected resource '{expected}', found '{}'",
        .actual.as_deref().unwrap_or("<none>")
    )]
    StaleBinding {
        /// The traffic class the binding belongs to.
        traffic_class: String,
        /// The resource the caller expected to be bound.
        expected: String,
        /// The resource actually bound.
        actual: Option<String>,
    },

    /// A binding state change that the lifecycle does not allow.
    #[error("invalid binding transition for '{traffic_class}' from {from} to {to}: {details}")]
    InvalidBindingTransition {
        /// The traffic class the binding belongs to.
        traffic_class: String,
        /// Current state.
        from: crate::binding::BindingState,
        /// Requested state.
        to: crate::binding::BindingState,
        /// Additional detail for the operator.
        details: String,
    },

    /// The external provisioning collaborator failed to apply a unit.
    #[error("provisioning of '{node}' failed: {source:#}")]
    ProvisioningFailure {
        /// The unit that failed.
        node: String,
        /// The collaborator's error, kept verbatim.
        #[source]
        source: anyhow::Error,
    },

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A registry file could not be parsed.
    #[error("configuration error: {0}")]
    Configuration(#[from] serde_yaml::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An invalid filesystem path was provided.
    #[error("invalid path {}: {reason}", path.display())]
    InvalidPath {
        /// The invalid path.
        path: PathBuf,
        /// The reason the path is invalid.
        reason: String,
    },

    /// A validation error occurred.
    #[error("validation error for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// A description of the validation failure.
        message: String,
    },

    /// The requested resource was not found.
    #[error("not found: {resource}")]
    NotFound {
        /// The resource that was not found.
        resource: String,
    },

    /// A database lock timeout occurred.
    #[error("database lock timeout after {seconds}s")]
    LockTimeout {
        /// The number of seconds waited before timing out.
        seconds: u64,
    },

    /// The binding store failed its integrity check.
    #[error("database corruption: {details}")]
    DatabaseCorruption {
        /// What the integrity check reported.
        details: String,
    },

    /// An unsupported schema version was encountered.
    #[error("unsupported schema version: expected {expected}, found {found}")]
    UnsupportedSchemaVersion {
        /// The expected schema version.
        expected: i32,
        /// The schema version found in the database.
        found: i32,
    },
}

fn format_cycle(cycle: &[String]) -> String {
    match cycle.first() {
        Some(first) => format!("{} -> {first}", cycle.join(" -> ")),
        None => String::from("<empty>"),
    }
}

/// Operator-facing classification of every [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Unknown environment/location or a malformed registry.
    Configuration,
    /// A disallowed rule for the environment's trust level.
    Policy,
    /// The dependency graph is malformed.
    Graph,
    /// A stable address could not be bound.
    Binding,
    /// The provisioning collaborator failed.
    Provisioning,
    /// Storage, I/O and other ambient failures.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "ConfigurationError"),
            Self::Policy => write!(f, "PolicyViolation"),
            Self::Graph => write!(f, "CyclicDependency"),
            Self::Binding => write!(f, "AddressBindingConflict"),
            Self::Provisioning => write!(f, "ProvisioningFailure"),
            Self::Internal => write!(f, "InternalError"),
        }
    }
}

impl From<crate::port::InvalidPortError> for Error {
    fn from(err: crate::port::InvalidPortError) -> Self {
        Self::Validation {
            field: "port".into(),
            message: err.to_string(),
        }
    }
}

impl Error {
    /// Returns the category this error belongs to.
    ///
    /// # Examples
    ///
    /// ```
    /// use stackplan::{Error, ErrorCategory};
    ///
    /// let err = Error::NoPrimaryLocation;
    /// assert_eq!(err.category(), ErrorCategory::Configuration);
    /// ```
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownEnvironment { .. }
            | Self::UnknownLocation { .. }
            | Self::NoPrimaryLocation
            | Self::InvalidRegistry { .. }
            | Self::Configuration(_)
            | Self::Validation { .. } => ErrorCategory::Configuration,
            Self::PolicyViolation { .. } => ErrorCategory::Policy,
            Self::CyclicDependency { .. }
            | Self::UnknownDependency { .. }
            | Self::DuplicateNode { .. } => ErrorCategory::Graph,
            Self::AddressBindingConflict { .. }
            | Self::StaleBinding { .. }
            | Self::InvalidBindingTransition { .. } => ErrorCategory::Binding,
            Self::ProvisioningFailure { .. } => ErrorCategory::Provisioning,
            Self::Database(_)
            | Self::Io(_)
            | Self::InvalidPath { .. }
            | Self::NotFound { .. }
            | Self::LockTimeout { .. }
            | Self::DatabaseCorruption { .. }
            | Self::UnsupportedSchemaVersion { .. } => ErrorCategory::Internal,
        }
    }

    /// Whether this error is raised by the planning gate, before any
    /// external side effect could have happened.
    #[must_use]
    pub fn is_pre_provisioning(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Configuration | ErrorCategory::Policy | ErrorCategory::Graph
        )
    }

    /// Check if error is a lock timeout.
    #[must_use]
    pub fn is_lock_timeout(&self) -> bool {
        match self {
            Self::LockTimeout { .. } => true,
            Self::Database(rusqlite::Error::SqliteFailure(err, _)) => {
                err.code == rusqlite::ErrorCode::DatabaseBusy
            }
            _ => false,
        }
    }
}
