//! CLI command implementations.
//!
//! Planning commands read the registry and print:
//! - `plan`: Full deployment plan for an environment and location
//! - `order`: Apply or teardown order of the provisioning units
//! - `show_context`: The resolved deployment context
//! - `list_environments` / `list_locations`: Registry contents
//! - `validate`: Check a registry file
//!
//! Binding commands read and change the stable address store:
//! - `bind_address`, `associate`, `reassociate`, `release_address`
//! - `list_bindings`: Stored bindings in several formats

pub mod associate;
pub mod bind_address;
pub mod completions;
pub mod list_bindings;
pub mod list_environments;
pub mod list_locations;
pub mod order;
pub mod plan;
pub mod reassociate;
pub mod release_address;
pub mod show_context;
pub mod validate;

pub use associate::AssociateCommand;
pub use bind_address::BindAddressCommand;
pub use completions::CompletionsCommand;
pub use list_bindings::ListBindingsCommand;
pub use list_environments::ListEnvironmentsCommand;
pub use list_locations::ListLocationsCommand;
pub use order::OrderCommand;
pub use plan::PlanCommand;
pub use reassociate::ReassociateCommand;
pub use release_address::ReleaseAddressCommand;
pub use show_context::ShowContextCommand;
pub use validate::ValidateCommand;
