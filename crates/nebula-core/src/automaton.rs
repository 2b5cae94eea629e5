//! The automaton: grid, agents, groups, and the random source.
//!
//! [`Automaton`] owns every piece of mutable state the tick cycle touches.
//! The grid is double-buffered: `front` holds the committed placement of
//! agent handles and `back` receives this tick's moves before the two are
//! swapped. Groups live in an ordered map keyed by handle so every pass
//! visits them in the same order for a given seed.

use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use nebula_agents::{Agent, AgentPool, Group, GroupRegistry};
use nebula_grid::{CellGrid, GridError, Torus};
use nebula_types::{AgentId, CellState, GridSnapshot, GroupId, GroupSummary, Position, StateCounts};

use crate::config::{ConfigError, SimulationConfig};
use crate::tick::{self, TickSummary};

/// Errors that can occur while building or seeding an automaton.
#[derive(Debug, thiserror::Error)]
pub enum AutomatonError {
    /// The configuration failed validation.
    #[error("invalid configuration: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// The grid could not be built.
    #[error("grid error: {source}")]
    Grid {
        /// The underlying grid error.
        #[from]
        source: GridError,
    },

    /// A seeded group needs a free gas agent at every listed cell.
    #[error("cell {position} holds a {state} agent and cannot join a seeded group")]
    UnseedableCell {
        /// The offending cell.
        position: Position,
        /// State of the agent found there.
        state: CellState,
    },

    /// Only forming and star groups can be seeded.
    #[error("cannot seed a group in state {state}")]
    UnseedableState {
        /// The requested state.
        state: CellState,
    },

    /// A seeded group needs at least one member.
    #[error("cannot seed an empty group")]
    EmptyGroup,
}

/// The star-formation automaton.
#[derive(Debug)]
pub struct Automaton {
    /// Validated configuration.
    pub(crate) config: SimulationConfig,
    /// Grid shape.
    pub(crate) torus: Torus,
    /// Every agent, one per cell.
    pub(crate) agents: AgentPool,
    /// Committed placement of agent handles.
    pub(crate) front: CellGrid<AgentId>,
    /// Write buffer for the movement phase.
    pub(crate) back: CellGrid<AgentId>,
    /// Active groups (plus merged or completed ones awaiting compaction).
    pub(crate) groups: BTreeMap<GroupId, Group>,
    /// Centroid cache of forming groups and the group handle allocator.
    pub(crate) registry: GroupRegistry,
    /// The single random source.
    pub(crate) rng: SmallRng,
    /// Ticks executed so far.
    pub(crate) tick: u64,
    /// Groups formed since construction.
    pub(crate) groups_formed_total: u64,
}

impl Automaton {
    /// Validate `config` and seed a fresh grid: each cell independently
    /// starts as gas with probability `p_gas`, otherwise empty.
    ///
    /// # Errors
    ///
    /// Returns [`AutomatonError::Config`] if the configuration is invalid.
    pub fn new(config: SimulationConfig) -> Result<Self, AutomatonError> {
        config.validate()?;
        let torus = Torus::new(config.world.size)?;
        let mut rng = SmallRng::seed_from_u64(config.world.seed);
        let p_gas = config.gas_probability();
        let states: Vec<CellState> = torus
            .positions()
            .map(|_| {
                if rng.random::<f64>() < p_gas {
                    CellState::Gas
                } else {
                    CellState::Empty
                }
            })
            .collect();
        let automaton = Self::assemble(config, torus, &states, rng)?;
        info!(
            size = torus.size(),
            seed = automaton.config.world.seed,
            gas = automaton.counts().gas,
            "Automaton seeded"
        );
        Ok(automaton)
    }

    /// Validate `config` and place the given row-major states on the grid.
    /// Only `Empty` and `Gas` are meaningful here; grouped states should
    /// be seeded with [`seed_group`](Self::seed_group).
    ///
    /// # Errors
    ///
    /// Returns [`AutomatonError::Config`] for an invalid configuration and
    /// [`AutomatonError::Grid`] if `states` does not hold `N * N` cells.
    pub fn from_states(
        config: SimulationConfig,
        states: &[CellState],
    ) -> Result<Self, AutomatonError> {
        config.validate()?;
        let torus = Torus::new(config.world.size)?;
        let rng = SmallRng::seed_from_u64(config.world.seed);
        Self::assemble(config, torus, states, rng)
    }

    fn assemble(
        config: SimulationConfig,
        torus: Torus,
        states: &[CellState],
        rng: SmallRng,
    ) -> Result<Self, AutomatonError> {
        let mut agents = AgentPool::with_capacity(torus.cell_count());
        let handles: Vec<AgentId> = torus
            .positions()
            .zip(states.iter())
            .map(|(position, state)| {
                let state = if state.is_grouped() { CellState::Gas } else { *state };
                agents.spawn(state, position)
            })
            .collect();
        let front = CellGrid::from_cells(torus, handles)?;
        let back = front.clone();
        Ok(Self {
            config,
            torus,
            agents,
            front,
            back,
            groups: BTreeMap::new(),
            registry: GroupRegistry::new(),
            rng,
            tick: 0,
            groups_formed_total: 0,
        })
    }

    /// Turn the gas agents at `positions` into a group in `state` that has
    /// already spent `steps` ticks in that state. Forming groups are
    /// registered for proximity ignition.
    ///
    /// # Errors
    ///
    /// Returns [`AutomatonError::UnseedableState`] unless `state` is
    /// forming or star, [`AutomatonError::EmptyGroup`] for no positions,
    /// and [`AutomatonError::UnseedableCell`] if a cell does not hold a
    /// free gas agent.
    pub fn seed_group(
        &mut self,
        positions: &[Position],
        state: CellState,
        steps: u32,
    ) -> Result<GroupId, AutomatonError> {
        if !state.is_bound() {
            return Err(AutomatonError::UnseedableState { state });
        }
        if positions.is_empty() {
            return Err(AutomatonError::EmptyGroup);
        }
        let mut members = Vec::with_capacity(positions.len());
        for &position in positions {
            let found = self.agent_at(position).map(|agent| (agent.id, agent.state));
            match found {
                Some((id, CellState::Gas)) => members.push(id),
                Some((_, found_state)) => {
                    return Err(AutomatonError::UnseedableCell {
                        position,
                        state: found_state,
                    });
                }
                None => {
                    return Err(AutomatonError::UnseedableCell {
                        position,
                        state: CellState::Empty,
                    });
                }
            }
        }

        let id = self.registry.allocate_id();
        let mut group = Group::new(id, self.config.lifecycle);
        group.state = state;
        for member in members {
            group.append(member, &mut self.agents);
        }
        group.steps = steps;
        if state == CellState::Forming {
            if let Some(center) = group.calculate_center(&self.agents) {
                self.registry.insert(id, center);
            }
        }
        self.groups.insert(id, group);
        Ok(id)
    }

    /// Put the gas agent at `position` into the dissipating walk, heading
    /// away from `center`, as if it had already walked `days` ticks.
    ///
    /// # Errors
    ///
    /// Returns [`AutomatonError::UnseedableCell`] if the cell does not
    /// hold a free gas agent.
    pub fn seed_dissipating(
        &mut self,
        position: Position,
        center: Position,
        days: u32,
    ) -> Result<GroupId, AutomatonError> {
        let id = self.registry.allocate_id();
        let handle = self.front.get(position).copied();
        let agent = handle.and_then(|h| self.agents.get_mut(h));
        match agent {
            Some(agent) if agent.state == CellState::Gas => {
                agent.join(id, CellState::Star);
                agent.begin_dissipation(center);
                agent.days_dissipating = days;
                Ok(id)
            }
            Some(agent) => Err(AutomatonError::UnseedableCell {
                position,
                state: agent.state,
            }),
            None => Err(AutomatonError::UnseedableCell {
                position,
                state: CellState::Empty,
            }),
        }
    }

    /// Run one tick and return its observable outputs.
    pub fn step(&mut self) -> TickSummary {
        tick::run_tick(self)
    }

    /// Validated configuration.
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Grid shape.
    pub const fn torus(&self) -> Torus {
        self.torus
    }

    /// Ticks executed so far.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Groups formed since construction.
    pub const fn groups_formed_total(&self) -> u64 {
        self.groups_formed_total
    }

    /// Every agent.
    pub const fn agents(&self) -> &AgentPool {
        &self.agents
    }

    /// Agent occupying `position`.
    pub fn agent_at(&self, position: Position) -> Option<&Agent> {
        self.front.get(position).and_then(|id| self.agents.get(*id))
    }

    /// State of the cell at `position`, `Empty` off the grid.
    pub fn state_at(&self, position: Position) -> CellState {
        self.agent_at(position)
            .map_or(CellState::Empty, |agent| agent.state)
    }

    /// Active group behind `id`.
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(&id).filter(|group| group.is_active())
    }

    /// Active groups in handle order.
    pub fn active_groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values().filter(|group| group.is_active())
    }

    /// Centroid cache of forming groups.
    pub const fn registry(&self) -> &GroupRegistry {
        &self.registry
    }

    /// State of every cell as a grid.
    pub fn state_grid(&self) -> CellGrid<CellState> {
        self.front.map(|id| self.agents.state_of(*id))
    }

    /// State of every cell, row-major.
    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            size: self.torus.size(),
            cells: self.state_grid().into_cells(),
        }
    }

    /// Number of agents in each state.
    pub fn counts(&self) -> StateCounts {
        StateCounts::tally(self.agents.iter().map(|agent| agent.state))
    }

    /// Summary of every active group, in handle order.
    pub fn groups(&self) -> Vec<GroupSummary> {
        self.active_groups()
            .map(|group| group.summary(&self.agents))
            .collect()
    }
}
