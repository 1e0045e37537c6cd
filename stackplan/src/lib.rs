#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # stackplan
//!
//! Deployment topology resolution and network segmentation planning for a
//! multi-environment, multi-region streaming service.
//!
//! One run resolves an (environment, location) pair against the registry,
//! derives the network rules and routing for every traffic class, orders the
//! provisioning units, and keeps a stable public address bound to whatever
//! resource fronts each stateful traffic class.
//!
//! ## Core Types
//!
//! - [`ConfigRegistry`]: environment and location profiles
//! - [`DeploymentContext`]: a validated pair with naming and tags
//! - [`network::TopologyPlanner`]: rules and routing assignments
//! - [`stack::StackGraph`]: apply and teardown order
//! - [`binding::EndpointStabilityManager`]: persistent address bindings
//! - [`operations::DeploymentPlanner`] and [`operations::PlanExecutor`]:
//!   the plan-execute pipeline
//! - [`Error`] and [`Result`]: Error handling types
//! - [`Logger`] and [`LogLevel`]: Logging infrastructure
//!
//! ## Examples
//!
//! ```
//! use stackplan::{ConfigRegistry, DeploymentContext};
//!
//! let registry = ConfigRegistry::builtin().unwrap();
//! let context = DeploymentContext::resolve(&registry, "production", "eu-west-1").unwrap();
//! assert_eq!(context.stack_name("application"), "streamr-p2p-production-ireland-application");
//!
//! let err = DeploymentContext::resolve(&registry, "prod", "eu-west-1").unwrap_err();
//! assert!(err.to_string().contains("beta, production, staging"));
//! ```

pub mod binding;
pub mod config;
pub mod context;
pub mod database;
pub mod error;
pub mod logging;
pub mod network;
pub mod operations;
pub mod output;
pub mod port;
pub mod stack;

// Re-export key types at crate root for convenience
pub use binding::{BindingKey, BindingState, EndpointStabilityManager, StableAddressBinding};
pub use config::{ConfigRegistry, InvocationInputs, RegistryLoader};
pub use context::DeploymentContext;
pub use database::{Database, DatabaseConfig};
pub use error::{Error, ErrorCategory, Result};
pub use logging::{init_logger, LogLevel, Logger};
pub use operations::{DeploymentPlan, DeploymentPlanner, ExecutionReport, PlanExecutor, PlanOptions};
pub use port::Port;
