//! Positions and the observable outputs of a tick.
//!
//! Everything in this module is what the automaton hands to the outside
//! world after each tick: a [`GridSnapshot`] of every cell's state, the
//! per-state [`StateCounts`], and a [`GroupSummary`] per active group.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::CellState;
use crate::ids::GroupId;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A cell coordinate on the `N x N` torus.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// Row index in `[0, N)`.
    pub row: usize,
    /// Column index in `[0, N)`.
    pub col: usize,
}

impl Position {
    /// Create a position from a row and a column.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

// ---------------------------------------------------------------------------
// State Counts
// ---------------------------------------------------------------------------

/// Number of agents in each state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StateCounts {
    /// Cells holding vacuum.
    pub empty: u64,
    /// Free gas agents.
    pub gas: u64,
    /// Agents in forming groups.
    pub forming: u64,
    /// Agents in ignited groups.
    pub star: u64,
    /// Agents dispersing after their star burned out.
    pub dissipating: u64,
}

impl StateCounts {
    /// Count the states yielded by an iterator.
    pub fn tally<I: IntoIterator<Item = CellState>>(states: I) -> Self {
        let mut counts = Self::default();
        for state in states {
            counts.record(state);
        }
        counts
    }

    /// Add one agent in `state`.
    pub const fn record(&mut self, state: CellState) {
        let slot = match state {
            CellState::Empty => &mut self.empty,
            CellState::Gas => &mut self.gas,
            CellState::Forming => &mut self.forming,
            CellState::Star => &mut self.star,
            CellState::Dissipating => &mut self.dissipating,
        };
        *slot = slot.saturating_add(1);
    }

    /// Number of agents in `state`.
    pub const fn get(&self, state: CellState) -> u64 {
        match state {
            CellState::Empty => self.empty,
            CellState::Gas => self.gas,
            CellState::Forming => self.forming,
            CellState::Star => self.star,
            CellState::Dissipating => self.dissipating,
        }
    }

    /// Number of cells counted.
    pub const fn total(&self) -> u64 {
        self.empty
            .saturating_add(self.gas)
            .saturating_add(self.forming)
            .saturating_add(self.star)
            .saturating_add(self.dissipating)
    }

    /// Number of non-empty cells.
    pub const fn occupied(&self) -> u64 {
        self.total().saturating_sub(self.empty)
    }
}

// ---------------------------------------------------------------------------
// Grid Snapshot
// ---------------------------------------------------------------------------

/// The state of every cell after a tick, in row-major order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GridSnapshot {
    /// Side length `N` of the grid.
    pub size: usize,
    /// `N * N` cell states, row-major.
    pub cells: Vec<CellState>,
}

impl GridSnapshot {
    /// State of the cell at `position`, if it lies on the grid.
    pub fn get(&self, position: Position) -> Option<CellState> {
        if position.row >= self.size || position.col >= self.size {
            return None;
        }
        let index = position
            .row
            .checked_mul(self.size)?
            .checked_add(position.col)?;
        self.cells.get(index).copied()
    }

    /// Integer codes of every cell, row-major.
    pub fn codes(&self) -> Vec<u8> {
        self.cells.iter().map(|state| state.code()).collect()
    }

    /// Integer codes as one vector per row, the shape a matrix renderer expects.
    pub fn rows(&self) -> Vec<Vec<u8>> {
        if self.size == 0 {
            return Vec::new();
        }
        self.cells
            .chunks(self.size)
            .map(|row| row.iter().map(|state| state.code()).collect())
            .collect()
    }

    /// Number of cells in each state.
    pub fn counts(&self) -> StateCounts {
        StateCounts::tally(self.cells.iter().copied())
    }

    /// Number of cells in `state`.
    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|cell| **cell == state).count()
    }

    /// Whether any cell is in `state`.
    pub fn contains(&self, state: CellState) -> bool {
        self.cells.contains(&state)
    }
}

// ---------------------------------------------------------------------------
// Group Summary
// ---------------------------------------------------------------------------

/// Read-only view of an active group, for collaborators diffing groups
/// between ticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GroupSummary {
    /// Group handle.
    pub id: GroupId,
    /// Lifecycle stage shared by every member.
    pub state: CellState,
    /// Number of members.
    pub size: usize,
    /// Ticks since the last transition.
    pub steps: u32,
    /// Rounded mean of member positions.
    pub center: Position,
}
