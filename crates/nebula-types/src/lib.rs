//! Shared type definitions for the Nebula star-formation automaton.
//!
//! This crate holds the vocabulary every other crate speaks: integer handles
//! for agents and groups, the [`CellState`] lifecycle, grid positions, and
//! the per-tick outputs consumed by renderers and statistics collectors.
//! Output types derive `ts-rs` so a browser renderer can share them.
//!
//! # Modules
//!
//! - [`ids`] -- Integer handles ([`AgentId`], [`GroupId`])
//! - [`enums`] -- The [`CellState`] lifecycle
//! - [`structs`] -- [`Position`], [`GridSnapshot`], [`StateCounts`], [`GroupSummary`]

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::CellState;
pub use ids::{AgentId, GroupId};
pub use structs::{GridSnapshot, GroupSummary, Position, StateCounts};
