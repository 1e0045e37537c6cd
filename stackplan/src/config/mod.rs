//! Registry configuration for stackplan.
//!
//! The registry is the flat, read-only table of environment and location
//! profiles plus the shared settings every deployment uses. It is loaded
//! once per process from, in order of precedence:
//!
//! 1. An explicit path (`--registry` / `STACKPLAN_REGISTRY`)
//! 2. The nearest `stackplan.yaml` walking up from the working directory
//! 3. The built-in registry
//!
//! # Examples
//!
//! ```
//! use stackplan::config::{ConfigRegistry, InvocationInputs};
//!
//! let registry = ConfigRegistry::builtin().unwrap();
//! let inputs = InvocationInputs::resolve(&registry, Some("staging"), Some("us-east-1")).unwrap();
//! assert_eq!(inputs.environment, "staging");
//! ```

pub mod environment;
pub mod loader;
pub mod registry;
pub mod schema;
pub mod validator;

pub use environment::{InputSource, InvocationInputs};
pub use loader::{RegistryLoader, RegistrySource};
pub use registry::{ConfigRegistry, BUILTIN_REGISTRY};
pub use schema::{
    AppConfig, DataServiceConfig, EnvironmentProfile, LiteralAddress, LocationProfile,
    MonitoringProfile, NetworkingConfig, OutputRef, RegistryFile, SizeClass, TopologyConfig,
    UnitDefinition,
};
pub use validator::RegistryValidator;
