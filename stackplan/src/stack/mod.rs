//! Provisioning unit ordering.
//!
//! [`StackGraph`] validates the dependency structure and produces the apply
//! and teardown orders; [`Rollout`] tracks one execution of that order.

pub mod graph;
pub mod rollout;

#[cfg(test)]
mod proptests;

pub use graph::{StackGraph, StackNode};
pub use rollout::{NodeState, Rollout};
