//! Stable public addresses for stateful traffic classes.
//!
//! A [`StableAddressBinding`] is created once per (environment, location,
//! traffic class) and survives replacement of the resource fronting that
//! class: the address is re-pointed, never re-allocated.

mod manager;
mod types;

pub use manager::EndpointStabilityManager;
pub use types::{BindingKey, BindingState, StableAddress, StableAddressBinding};
