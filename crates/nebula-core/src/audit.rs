//! Structural invariant checks.
//!
//! [`Automaton::audit`] walks the whole automaton and reports every broken
//! invariant. The tick cycle asserts an empty report in debug builds;
//! tests call it directly after every tick.

use std::collections::BTreeMap;

use nebula_types::{AgentId, CellState, GroupId, Position};

use crate::automaton::Automaton;

/// One broken invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    /// An active group lists an agent that does not point back at it or
    /// does not share its state.
    #[error("agent {agent} is listed in group {group} but carries group {found:?} in state {state}")]
    MemberMismatch {
        /// The group listing the agent.
        group: GroupId,
        /// The listed agent.
        agent: AgentId,
        /// Group handle the agent carries.
        found: Option<GroupId>,
        /// State the agent is in.
        state: CellState,
    },

    /// An agent is listed by two active groups.
    #[error("agent {agent} belongs to both group {first} and group {second}")]
    SharedMember {
        /// The shared agent.
        agent: AgentId,
        /// First group listing it.
        first: GroupId,
        /// Second group listing it.
        second: GroupId,
    },

    /// An agent carries a group handle iff it is forming, star, or
    /// dissipating; this one does not.
    #[error("agent {agent} in state {state} has group {group:?}")]
    HandleMismatch {
        /// The agent.
        agent: AgentId,
        /// Its state.
        state: CellState,
        /// Its group handle.
        group: Option<GroupId>,
    },

    /// A forming or star agent is not listed by an active group.
    #[error("agent {agent} in state {state} is not a member of an active group")]
    Orphaned {
        /// The agent.
        agent: AgentId,
        /// Its state.
        state: CellState,
    },

    /// The agent at a cell does not record that cell as its position.
    #[error("agent {agent} sits at {cell} but records position {recorded}")]
    PositionMismatch {
        /// The agent.
        agent: AgentId,
        /// Cell holding it.
        cell: Position,
        /// Position it records.
        recorded: Position,
    },

    /// The same agent occupies more than one cell.
    #[error("agent {agent} occupies more than one cell")]
    DuplicatePlacement {
        /// The agent.
        agent: AgentId,
    },

    /// Agents and cells are not in one-to-one correspondence.
    #[error("{agents} agents for {cells} cells")]
    PopulationMismatch {
        /// Agents in the pool.
        agents: usize,
        /// Cells on the grid.
        cells: usize,
    },

    /// A merged or completed group is still in the group table.
    #[error("group {group} is no longer active but was not compacted")]
    InactiveGroup {
        /// The group.
        group: GroupId,
    },

    /// An active group has no members.
    #[error("group {group} has no members")]
    EmptyGroup {
        /// The group.
        group: GroupId,
    },

    /// The registry holds a group that is not an active forming group.
    #[error("registry entry {group} is not an active forming group")]
    StaleRegistryEntry {
        /// The group.
        group: GroupId,
    },
}

impl Automaton {
    /// Every broken invariant, in a stable order. Empty when the automaton
    /// is consistent.
    pub fn audit(&self) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();
        self.audit_placement(&mut violations);
        self.audit_groups(&mut violations);
        self.audit_agents(&mut violations);
        self.audit_registry(&mut violations);
        violations
    }

    fn audit_placement(&self, violations: &mut Vec<InvariantViolation>) {
        let cells = self.torus.cell_count();
        if self.agents.len() != cells {
            violations.push(InvariantViolation::PopulationMismatch {
                agents: self.agents.len(),
                cells,
            });
        }
        let mut seen = vec![false; self.agents.len()];
        for (cell, id) in self.front.iter() {
            match seen.get_mut(id.index()) {
                Some(flag) if *flag => {
                    violations.push(InvariantViolation::DuplicatePlacement { agent: *id });
                }
                Some(flag) => *flag = true,
                None => {}
            }
            if let Some(agent) = self.agents.get(*id) {
                if agent.position != cell {
                    violations.push(InvariantViolation::PositionMismatch {
                        agent: *id,
                        cell,
                        recorded: agent.position,
                    });
                }
            }
        }
    }

    fn audit_groups(&self, violations: &mut Vec<InvariantViolation>) {
        let mut owner: BTreeMap<AgentId, GroupId> = BTreeMap::new();
        for group in self.groups.values() {
            if !group.is_active() {
                violations.push(InvariantViolation::InactiveGroup { group: group.id });
                continue;
            }
            if group.size() == 0 {
                violations.push(InvariantViolation::EmptyGroup { group: group.id });
            }
            for id in group.members() {
                if let Some(first) = owner.insert(*id, group.id) {
                    violations.push(InvariantViolation::SharedMember {
                        agent: *id,
                        first,
                        second: group.id,
                    });
                }
                let Some(agent) = self.agents.get(*id) else {
                    continue;
                };
                if agent.group != Some(group.id) || agent.state != group.state {
                    violations.push(InvariantViolation::MemberMismatch {
                        group: group.id,
                        agent: *id,
                        found: agent.group,
                        state: agent.state,
                    });
                }
            }
        }
    }

    fn audit_agents(&self, violations: &mut Vec<InvariantViolation>) {
        for agent in self.agents.iter() {
            if agent.state.is_grouped() != agent.group.is_some() {
                violations.push(InvariantViolation::HandleMismatch {
                    agent: agent.id,
                    state: agent.state,
                    group: agent.group,
                });
            }
            if agent.state.is_bound() {
                let listed = agent
                    .group
                    .and_then(|id| self.group(id))
                    .is_some_and(|group| group.contains(agent.id));
                if !listed {
                    violations.push(InvariantViolation::Orphaned {
                        agent: agent.id,
                        state: agent.state,
                    });
                }
            }
        }
    }

    fn audit_registry(&self, violations: &mut Vec<InvariantViolation>) {
        for (id, _) in self.registry.iter() {
            let forming = self
                .group(id)
                .is_some_and(|group| group.state == CellState::Forming);
            if !forming {
                violations.push(InvariantViolation::StaleRegistryEntry { group: id });
            }
        }
    }
}
