//! Groups of agents sharing a lifecycle.
//!
//! A [`Group`] is created `Forming` by the clustering pass, grows by
//! absorbing gas and by merging with neighbours, ignites into a `Star`,
//! and finally dissipates. Every transition is pushed to all members so an
//! agent's state always equals its group's state while the group is
//! active.
//!
//! # Lifecycle
//!
//! ```text
//! Forming --(steps >= star_duration && size >= formation_size)--> Star
//! Forming --(forced by a nearby ready group)---------------------> Star
//! Star    --(steps >= dissipation_duration)----------------------> Dissipating (completed)
//! ```
//!
//! `steps` is incremented before the thresholds are tested, so a group that
//! has spent `star_duration - 1` ticks forming ignites on the next update.

use std::collections::BTreeSet;

use nebula_types::{AgentId, CellState, GroupId, GroupSummary, Position};

use crate::agent::AgentPool;
use crate::config::LifecycleConfig;

/// Whether a group still takes part in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupStatus {
    /// In the active set.
    Active,
    /// Absorbed by another group; removed at the next compaction.
    Merged,
    /// Its star burned out; removed at the next compaction.
    Completed,
}

/// Outcome of one lifecycle update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupTransition {
    /// Nothing changed besides the step counter.
    Unchanged,
    /// The group became a star.
    Ignited,
    /// The star burned out; members walk away from `center`.
    Dissipated {
        /// Centroid handed to every member.
        center: Position,
    },
}

/// An aggregate of agents sharing a lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Handle assigned by the registry.
    pub id: GroupId,
    /// Member handles. `size() == members.len()` by construction.
    members: BTreeSet<AgentId>,
    /// Lifecycle stage shared by every member.
    pub state: CellState,
    /// Ticks since the last transition.
    pub steps: u32,
    /// Thresholds driving transitions.
    pub thresholds: LifecycleConfig,
    /// Active, merged, or completed.
    pub status: GroupStatus,
}

impl Group {
    /// Create an empty forming group.
    pub const fn new(id: GroupId, thresholds: LifecycleConfig) -> Self {
        Self {
            id,
            members: BTreeSet::new(),
            state: CellState::Forming,
            steps: 0,
            thresholds,
            status: GroupStatus::Active,
        }
    }

    /// Number of members.
    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Member handles in ascending order.
    pub const fn members(&self) -> &BTreeSet<AgentId> {
        &self.members
    }

    /// Whether `agent` is a member.
    pub fn contains(&self, agent: AgentId) -> bool {
        self.members.contains(&agent)
    }

    /// Whether the group is still in the active set.
    pub fn is_active(&self) -> bool {
        self.status == GroupStatus::Active
    }

    /// Add `agent` and push the group's handle and state onto it. Returns
    /// `false` if the agent was already a member.
    pub fn append(&mut self, agent: AgentId, pool: &mut AgentPool) -> bool {
        if !self.members.insert(agent) {
            return false;
        }
        if let Some(member) = pool.get_mut(agent) {
            member.join(self.id, self.state);
        }
        true
    }

    /// Absorb every member of `other`. The absorbed agents take this
    /// group's handle and state, and `other` is left empty and flagged
    /// [`GroupStatus::Merged`].
    pub fn merge(&mut self, other: &mut Self, pool: &mut AgentPool) {
        for agent in core::mem::take(&mut other.members) {
            self.append(agent, pool);
        }
        other.status = GroupStatus::Merged;
    }

    /// Rounded arithmetic mean of member positions, or `None` for an empty
    /// group. Depends only on membership and positions.
    pub fn calculate_center(&self, pool: &AgentPool) -> Option<Position> {
        let mut row_sum: usize = 0;
        let mut col_sum: usize = 0;
        let mut count: usize = 0;
        for agent in self.members.iter().filter_map(|id| pool.get(*id)) {
            row_sum = row_sum.checked_add(agent.position.row)?;
            col_sum = col_sum.checked_add(agent.position.col)?;
            count = count.checked_add(1)?;
        }
        if count == 0 {
            return None;
        }
        Some(Position::new(
            rounded_mean(row_sum, count)?,
            rounded_mean(col_sum, count)?,
        ))
    }

    /// Whether this group will meet the ignition condition at its next
    /// update, given that the update increments `steps` first.
    pub fn ignition_due(&self) -> bool {
        matches!(self.state, CellState::Forming)
            && self
                .thresholds
                .ignition_met(self.members.len(), self.steps.saturating_add(1))
    }

    /// Turn the group into a star.
    pub fn ignite(&mut self, pool: &mut AgentPool) {
        self.transition(CellState::Star, pool);
        tracing::debug!(group = %self.id, size = self.size(), "group ignited");
    }

    /// Burn the star out: members start dispersing from the centroid and
    /// the group is flagged [`GroupStatus::Completed`].
    pub fn dissipate(&mut self, pool: &mut AgentPool) -> Position {
        let center = self.calculate_center(pool).unwrap_or_default();
        self.state = CellState::Dissipating;
        self.steps = 0;
        self.status = GroupStatus::Completed;
        for id in &self.members {
            if let Some(agent) = pool.get_mut(*id) {
                agent.begin_dissipation(center);
            }
        }
        tracing::debug!(group = %self.id, %center, "group dissipated");
        center
    }

    /// Advance the lifecycle by one tick. `force_ignition` makes a forming
    /// group ignite regardless of its own thresholds.
    pub fn update(&mut self, pool: &mut AgentPool, force_ignition: bool) -> GroupTransition {
        self.steps = self.steps.saturating_add(1);
        match self.state {
            CellState::Forming
                if force_ignition || self.thresholds.ignition_met(self.size(), self.steps) =>
            {
                self.ignite(pool);
                GroupTransition::Ignited
            }
            CellState::Star if self.thresholds.dissipation_met(self.steps) => {
                GroupTransition::Dissipated {
                    center: self.dissipate(pool),
                }
            }
            _ => GroupTransition::Unchanged,
        }
    }

    /// Read-only view for observers.
    pub fn summary(&self, pool: &AgentPool) -> GroupSummary {
        GroupSummary {
            id: self.id,
            state: self.state,
            size: self.size(),
            steps: self.steps,
            center: self.calculate_center(pool).unwrap_or_default(),
        }
    }

    fn transition(&mut self, state: CellState, pool: &mut AgentPool) {
        self.state = state;
        self.steps = 0;
        for id in &self.members {
            if let Some(agent) = pool.get_mut(*id) {
                agent.set_state(state);
            }
        }
    }
}

/// `sum / count` rounded half up.
fn rounded_mean(sum: usize, count: usize) -> Option<usize> {
    sum.checked_mul(2)?
        .checked_add(count)?
        .checked_div(count.checked_mul(2)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn thresholds() -> LifecycleConfig {
        LifecycleConfig {
            formation_size: 3,
            star_duration: 2,
            dissipation_duration: 2,
            dissipation_steps: 4,
        }
    }

    /// A pool of gas agents at the given positions and a group holding the
    /// first `members` of them.
    fn setup(positions: &[(usize, usize)], members: usize) -> (AgentPool, Group) {
        let mut pool = AgentPool::new();
        let ids: Vec<AgentId> = positions
            .iter()
            .map(|&(r, c)| pool.spawn(CellState::Gas, Position::new(r, c)))
            .collect();
        let mut group = Group::new(GroupId::new(1), thresholds());
        for id in ids.iter().take(members) {
            group.append(*id, &mut pool);
        }
        (pool, group)
    }

    #[test]
    fn append_pushes_state_and_rejects_duplicates() {
        let (mut pool, mut group) = setup(&[(0, 0), (0, 1)], 1);
        assert_eq!(pool.state_of(AgentId::new(0)), CellState::Forming);
        assert!(!group.append(AgentId::new(0), &mut pool));
        assert!(group.append(AgentId::new(1), &mut pool));
        assert_eq!(group.size(), 2);
        assert_eq!(pool.get(AgentId::new(1)).unwrap().group, Some(GroupId::new(1)));
    }

    #[test]
    fn center_is_rounded_mean() {
        let (pool, group) = setup(&[(0, 0), (0, 1), (1, 1), (3, 3)], 4);
        // rows: 4 / 4 = 1, cols: 5 / 4 = 1.25
        assert_eq!(group.calculate_center(&pool), Some(Position::new(1, 1)));

        let (pool, group) = setup(&[(0, 0), (1, 1)], 2);
        // 0.5 rounds up
        assert_eq!(group.calculate_center(&pool), Some(Position::new(1, 1)));
    }

    #[test]
    fn center_ignores_wraparound() {
        // Rows 98, 99, 0, 1 touch across the edge of a 100-wide grid, but
        // the plain mean of the coordinates is used.
        let (pool, group) = setup(&[(98, 0), (99, 0), (0, 0), (1, 0)], 4);
        assert_eq!(group.calculate_center(&pool), Some(Position::new(50, 0)));
    }

    #[test]
    fn center_is_idempotent() {
        let (pool, group) = setup(&[(2, 7), (4, 1), (9, 9)], 3);
        let first = group.calculate_center(&pool);
        assert_eq!(group.calculate_center(&pool), first);
    }

    #[test]
    fn empty_group_has_no_center() {
        let (pool, group) = setup(&[(0, 0)], 0);
        assert_eq!(group.calculate_center(&pool), None);
    }

    #[test]
    fn ignites_once_thresholds_are_met() {
        let (mut pool, mut group) = setup(&[(0, 0), (0, 1), (0, 2)], 3);
        group.steps = 1;
        assert!(group.ignition_due());
        assert_eq!(group.update(&mut pool, false), GroupTransition::Ignited);
        assert_eq!(group.state, CellState::Star);
        assert_eq!(group.steps, 0);
        assert!(group.members().iter().all(|id| pool.state_of(*id) == CellState::Star));
    }

    #[test]
    fn small_group_keeps_forming() {
        let (mut pool, mut group) = setup(&[(0, 0), (0, 1)], 2);
        group.steps = 5;
        assert!(!group.ignition_due());
        assert_eq!(group.update(&mut pool, false), GroupTransition::Unchanged);
        assert_eq!(group.steps, 6);
    }

    #[test]
    fn forced_ignition_ignores_size() {
        let (mut pool, mut group) = setup(&[(0, 0)], 1);
        assert_eq!(group.update(&mut pool, true), GroupTransition::Ignited);
        assert_eq!(group.state, CellState::Star);
    }

    #[test]
    fn star_dissipates_and_completes() {
        let (mut pool, mut group) = setup(&[(2, 2), (2, 4), (4, 2), (4, 4)], 4);
        group.ignite(&mut pool);
        group.steps = 2;
        let transition = group.update(&mut pool, false);
        assert_eq!(
            transition,
            GroupTransition::Dissipated {
                center: Position::new(3, 3)
            }
        );
        assert_eq!(group.status, GroupStatus::Completed);
        for agent in pool.iter() {
            assert_eq!(agent.state, CellState::Dissipating);
            assert_eq!(agent.center_group, Some(Position::new(3, 3)));
            assert_eq!(agent.group, Some(GroupId::new(1)));
        }
    }

    #[test]
    fn merge_produces_exact_union() {
        let mut pool = AgentPool::new();
        let ids: Vec<AgentId> = (0..5)
            .map(|c| pool.spawn(CellState::Gas, Position::new(0, c)))
            .collect();
        let mut big = Group::new(GroupId::new(1), thresholds());
        let mut small = Group::new(GroupId::new(2), thresholds());
        for id in ids.iter().take(3) {
            big.append(*id, &mut pool);
        }
        for id in ids.iter().skip(3) {
            small.append(*id, &mut pool);
        }

        big.merge(&mut small, &mut pool);

        let expected: BTreeSet<AgentId> = ids.iter().copied().collect();
        assert_eq!(big.members(), &expected);
        assert_eq!(big.size(), 5);
        assert_eq!(small.status, GroupStatus::Merged);
        assert_eq!(small.size(), 0);
        assert!(pool.iter().all(|a| a.group == Some(GroupId::new(1))));
    }

    #[test]
    fn summary_reports_center_and_size() {
        let (pool, group) = setup(&[(1, 1), (1, 3)], 2);
        let summary = group.summary(&pool);
        assert_eq!(summary.size, 2);
        assert_eq!(summary.center, Position::new(1, 2));
        assert_eq!(summary.state, CellState::Forming);
    }
}
