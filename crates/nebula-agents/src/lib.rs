//! Agents, groups, and movement rules for the Nebula automaton.
//!
//! This crate contains the per-entity logic: what an agent carries, how a
//! group moves through its lifecycle, how forming groups are indexed for
//! proximity ignition, and where an agent wants to step next. It sits
//! between `nebula-grid` (topology) and `nebula-core` (the tick cycle that
//! wires these pieces together).
//!
//! # Modules
//!
//! - [`agent`] -- Grid occupants and their pool ([`Agent`], [`AgentPool`])
//! - [`config`] -- Lifecycle thresholds ([`LifecycleConfig`])
//! - [`group`] -- Group membership and lifecycle ([`Group`], [`GroupTransition`])
//! - [`movement`] -- Biased walk and dispersal walk ([`propose_move`], [`dissipation_step`])
//! - [`registry`] -- Centroid cache of forming groups ([`GroupRegistry`])

pub mod agent;
pub mod config;
pub mod group;
pub mod movement;
pub mod registry;

pub use agent::{Agent, AgentPool};
pub use config::LifecycleConfig;
pub use group::{Group, GroupStatus, GroupTransition};
pub use movement::{dissipation_step, propose_move};
pub use registry::GroupRegistry;
