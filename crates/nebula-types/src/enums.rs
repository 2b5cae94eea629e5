//! Enumeration types for the Nebula automaton.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Cell State
// ---------------------------------------------------------------------------

/// Discrete lifecycle state of the agent occupying a cell.
///
/// The ordering is meaningful: later variants dominate earlier ones when
/// two groups merge, and the numeric code is what renderers and counters
/// consume.
///
/// | Code | State         | Moves by          | Has group |
/// |------|---------------|-------------------|-----------|
/// | 0    | `Empty`       | never             | no        |
/// | 1    | `Gas`         | biased walk       | no        |
/// | 2    | `Forming`     | biased walk       | yes       |
/// | 3    | `Star`        | biased walk       | yes       |
/// | 4    | `Dissipating` | outward walk      | yes       |
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CellState {
    /// Vacant cell. Still a real occupant, just an inert one.
    #[default]
    Empty = 0,
    /// Ambient medium, free to drift and to be captured by groups.
    Gas = 1,
    /// Member of a group that has not ignited yet.
    Forming = 2,
    /// Member of an ignited group.
    Star = 3,
    /// Former star member walking away from the group's centroid.
    Dissipating = 4,
}

impl CellState {
    /// Every state in ordinal order.
    pub const ALL: [Self; 5] = [
        Self::Empty,
        Self::Gas,
        Self::Forming,
        Self::Star,
        Self::Dissipating,
    ];

    /// Integer code of this state (0 through 4).
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Parse an integer code back into a state.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Empty),
            1 => Some(Self::Gas),
            2 => Some(Self::Forming),
            3 => Some(Self::Star),
            4 => Some(Self::Dissipating),
            _ => None,
        }
    }

    /// Whether the cell holds anything other than vacuum.
    pub const fn is_occupied(self) -> bool {
        !matches!(self, Self::Empty)
    }

    /// States that take a density-biased step each tick.
    pub const fn is_mobile(self) -> bool {
        matches!(self, Self::Gas | Self::Forming | Self::Star)
    }

    /// States that must carry a group handle.
    pub const fn is_grouped(self) -> bool {
        matches!(self, Self::Forming | Self::Star | Self::Dissipating)
    }

    /// States whose group can capture gas and merge with neighbours.
    pub const fn is_bound(self) -> bool {
        matches!(self, Self::Forming | Self::Star)
    }

    /// Weight contributed by this state to a state-weighted density sum.
    pub fn weight(self) -> f64 {
        f64::from(self.code())
    }
}

impl core::fmt::Display for CellState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Empty => "empty",
            Self::Gas => "gas",
            Self::Forming => "forming",
            Self::Star => "star",
            Self::Dissipating => "dissipating",
        };
        f.write_str(name)
    }
}
