//! Grid occupants and the pool that owns them.
//!
//! Every cell of the grid holds exactly one [`Agent`]; vacuum is an agent
//! in [`CellState::Empty`]. Agents are created once when the grid is seeded
//! and never destroyed, so an [`AgentId`] stays valid for the whole run.
//! The [`AgentPool`] owns them in a flat vector indexed by handle.

use nebula_types::{AgentId, CellState, GroupId, Position};

/// A single grid occupant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    /// Handle of this agent in the pool.
    pub id: AgentId,
    /// Current lifecycle state.
    pub state: CellState,
    /// Cell the agent occupies, refreshed every tick.
    pub position: Position,
    /// Group this agent belongs to. Present iff the state is forming, star,
    /// or dissipating.
    pub group: Option<GroupId>,
    /// Centroid of the group at the moment it started dissipating.
    pub center_group: Option<Position>,
    /// Ticks since the last state change.
    pub steps_in_state: u32,
    /// Ticks spent walking away from `center_group`.
    pub days_dissipating: u32,
}

impl Agent {
    /// Create an ungrouped agent.
    pub const fn new(id: AgentId, state: CellState, position: Position) -> Self {
        Self {
            id,
            state,
            position,
            group: None,
            center_group: None,
            steps_in_state: 0,
            days_dissipating: 0,
        }
    }

    /// Change state, resetting `steps_in_state` when the state differs.
    pub fn set_state(&mut self, state: CellState) {
        if self.state != state {
            self.state = state;
            self.steps_in_state = 0;
        }
    }

    /// Attach to `group` and take on the group's state.
    pub fn join(&mut self, group: GroupId, state: CellState) {
        self.group = Some(group);
        self.set_state(state);
    }

    /// Start walking away from `center`.
    pub fn begin_dissipation(&mut self, center: Position) {
        self.set_state(CellState::Dissipating);
        self.center_group = Some(center);
        self.days_dissipating = 0;
    }

    /// Revert to free gas, dropping every group link.
    pub fn release(&mut self) {
        self.set_state(CellState::Gas);
        self.group = None;
        self.center_group = None;
        self.days_dissipating = 0;
    }

    /// Count one tick of dispersal. Releases the agent back to gas once
    /// `dissipation_steps` ticks have passed and returns `true` if it did.
    pub fn tick_dissipation(&mut self, dissipation_steps: u32) -> bool {
        self.days_dissipating = self.days_dissipating.saturating_add(1);
        if self.days_dissipating >= dissipation_steps {
            self.release();
            return true;
        }
        false
    }

    /// Count one tick in the current state.
    pub const fn age(&mut self) {
        self.steps_in_state = self.steps_in_state.saturating_add(1);
    }
}

/// Owner of every agent, indexed by [`AgentId`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentPool {
    /// Agents in handle order.
    agents: Vec<Agent>,
}

impl AgentPool {
    /// Create an empty pool.
    pub const fn new() -> Self {
        Self { agents: Vec::new() }
    }

    /// Create an empty pool with room for `capacity` agents.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            agents: Vec::with_capacity(capacity),
        }
    }

    /// Add an ungrouped agent and return its handle.
    pub fn spawn(&mut self, state: CellState, position: Position) -> AgentId {
        let id = AgentId::new(self.agents.len());
        self.agents.push(Agent::new(id, state, position));
        id
    }

    /// Agent behind `id`.
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.index())
    }

    /// Mutable agent behind `id`.
    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(id.index())
    }

    /// State of the agent behind `id`, `Empty` for unknown handles.
    pub fn state_of(&self, id: AgentId) -> CellState {
        self.get(id).map_or(CellState::Empty, |agent| agent.state)
    }

    /// Number of agents.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the pool holds no agents.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Agents in handle order.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    /// Mutable agents in handle order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.agents.iter_mut()
    }
}
