//! Integer handles for agents and groups.
//!
//! Agents and groups never hold references to each other. An agent carries
//! the [`GroupId`] of the group it belongs to and a group carries the
//! [`AgentId`]s of its members; every dereference goes through the owning
//! pool or group table. Handles are plain integers so they are `Copy`,
//! ordered, and cheap to store in grids.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates an integer newtype handle with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident($inner:ty)
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub $inner);

        impl $name {
            /// Wrap a raw integer value.
            pub const fn new(raw: $inner) -> Self {
                Self(raw)
            }

            /// Return the raw integer value.
            pub const fn into_inner(self) -> $inner {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(raw: $inner) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for $inner {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Handle of an agent. The raw value is the agent's slot in the agent pool,
    /// assigned once at grid initialization.
    AgentId(usize)
}

define_id! {
    /// Handle of a group, assigned by the group registry on registration.
    /// Values increase monotonically and are never reused within a run.
    GroupId(u64)
}

impl AgentId {
    /// Slot of this agent in the agent pool.
    pub const fn index(self) -> usize {
        self.0
    }
}
