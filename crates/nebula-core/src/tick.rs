//! Tick cycle: the phase loop that drives the automaton.
//!
//! Each tick runs through these phases:
//!
//! 1. **Age** -- every agent counts one more tick in its current state.
//!
//! 2. **Density** -- the density field is computed from the pre-move
//!    state snapshot.
//!
//! 3. **Movement** -- agents are visited in row-major order of the
//!    committed grid. Gas, forming, and star agents take one biased step;
//!    dissipating agents step away from their group's centroid and count
//!    down to their release as gas. Moves land in the back buffer and only
//!    into cells still empty there.
//!
//! 4. **Commit** -- the buffers are swapped and agent positions refreshed.
//!
//! 5. **Clustering** -- gas agents, in row-major order, are captured by an
//!    adjacent group member that was bound before the pass, or seed a new
//!    forming group when enough gas surrounds them.
//!
//! 6. **Merge** -- adjacent bound agents of different groups fuse their
//!    groups; losers are compacted out and evicted from the registry.
//!
//! 7. **Lifecycle** -- registry centroids are refreshed, ready groups and
//!    their close neighbours ignite, burnt-out stars dissipate, and
//!    completed groups are compacted out.
//!
//! The tick cycle is deterministic given the same seed and configuration.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use nebula_agents::{Group, GroupTransition, dissipation_step, propose_move};
use nebula_grid::{CellGrid, DensityField, density_field};
use nebula_types::{AgentId, CellState, GridSnapshot, GroupId, GroupSummary, StateCounts};

use crate::automaton::Automaton;

/// Radius within which bound agents of different groups merge.
const MERGE_RADIUS: usize = 1;

/// Observable outputs of a single tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickSummary {
    /// The tick number that was executed (first tick is 1).
    pub tick: u64,
    /// State of every cell after the tick.
    pub snapshot: GridSnapshot,
    /// Agents per state after the tick.
    pub counts: StateCounts,
    /// New groups formed by clustering.
    pub groups_formed: u32,
    /// Groups absorbed by a neighbour.
    pub groups_merged: u32,
    /// Groups that became stars.
    pub groups_ignited: u32,
    /// Stars that burned out.
    pub groups_dissipated: u32,
    /// Agents whose proposed move committed.
    pub agents_moved: u32,
    /// Dissipating agents that reverted to gas.
    pub agents_released: u32,
    /// Every active group after the tick, in handle order.
    pub active_groups: Vec<GroupSummary>,
}

/// Result of the movement phase.
#[derive(Debug, Default)]
struct MovementResult {
    /// Committed moves.
    moved: u32,
    /// Dissipating agents released back to gas.
    released: u32,
}

/// Result of the lifecycle phase.
#[derive(Debug, Default)]
struct LifecycleResult {
    /// Groups that ignited.
    ignited: u32,
    /// Groups that dissipated.
    dissipated: u32,
}

/// Execute one complete tick and return what happened.
pub fn run_tick(automaton: &mut Automaton) -> TickSummary {
    automaton.tick = automaton.tick.saturating_add(1);
    let tick = automaton.tick;

    // --- Phase 1: Age ---
    for agent in automaton.agents.iter_mut() {
        agent.age();
    }

    // --- Phase 2: Density ---
    let states = automaton.state_grid();
    let density = density_field(
        &states,
        automaton.config.density.radius,
        automaton.config.density.mode,
    );

    // --- Phase 3: Movement ---
    let movement = phase_movement(automaton, &states, &density);

    // --- Phase 4: Commit ---
    phase_commit(automaton);

    // --- Phase 5: Clustering ---
    let groups_formed = phase_clustering(automaton);

    // --- Phase 6: Merge ---
    let groups_merged = phase_merge(automaton);
    compact(automaton);

    // --- Phase 7: Lifecycle ---
    refresh_registry(automaton);
    let lifecycle = phase_lifecycle(automaton);
    compact(automaton);

    automaton.groups_formed_total = automaton
        .groups_formed_total
        .saturating_add(u64::from(groups_formed));

    debug_assert!(
        automaton.audit().is_empty(),
        "invariants broken after tick {tick}: {:?}",
        automaton.audit()
    );

    let snapshot = automaton.snapshot();
    let counts = snapshot.counts();
    debug!(
        tick,
        gas = counts.gas,
        forming = counts.forming,
        star = counts.star,
        dissipating = counts.dissipating,
        formed = groups_formed,
        merged = groups_merged,
        moved = movement.moved,
        "Tick complete"
    );

    TickSummary {
        tick,
        snapshot,
        counts,
        groups_formed,
        groups_merged,
        groups_ignited: lifecycle.ignited,
        groups_dissipated: lifecycle.dissipated,
        agents_moved: movement.moved,
        agents_released: movement.released,
        active_groups: automaton.groups(),
    }
}

// ---------------------------------------------------------------------------
// Phase 3: Movement
// ---------------------------------------------------------------------------

/// Move every mobile agent into the back buffer.
fn phase_movement(
    automaton: &mut Automaton,
    states: &CellGrid<CellState>,
    density: &DensityField,
) -> MovementResult {
    let mut result = MovementResult::default();
    let radius = automaton.config.movement.radius;
    let mask = automaton.config.density.mode.masks_occupied();
    let dissipation_steps = automaton.config.lifecycle.dissipation_steps;
    let torus = automaton.torus;

    automaton.back.copy_from(&automaton.front);

    for (origin, id) in automaton.front.iter() {
        let Some(agent) = automaton.agents.get(*id) else {
            continue;
        };
        let state = agent.state;
        let center = agent.center_group;

        let destination = match state {
            CellState::Empty => continue,
            CellState::Gas | CellState::Forming | CellState::Star => {
                propose_move(origin, radius, density, states, mask, &mut automaton.rng)
            }
            CellState::Dissipating => dissipation_step(
                torus,
                origin,
                center.unwrap_or(origin),
                &mut automaton.rng,
            ),
        };

        let target_free = automaton
            .back
            .get(destination)
            .is_some_and(|occupant| automaton.agents.state_of(*occupant) == CellState::Empty);
        if destination != origin && target_free && automaton.back.swap(origin, destination) {
            result.moved = result.moved.saturating_add(1);
        }

        if state == CellState::Dissipating {
            if let Some(agent) = automaton.agents.get_mut(*id) {
                if agent.tick_dissipation(dissipation_steps) {
                    result.released = result.released.saturating_add(1);
                }
            }
        }
    }
    result
}

// ---------------------------------------------------------------------------
// Phase 4: Commit
// ---------------------------------------------------------------------------

/// Swap the buffers and record each agent's new cell.
fn phase_commit(automaton: &mut Automaton) {
    core::mem::swap(&mut automaton.front, &mut automaton.back);
    for (position, id) in automaton.front.iter() {
        if let Some(agent) = automaton.agents.get_mut(*id) {
            agent.position = position;
        }
    }
}

// ---------------------------------------------------------------------------
// Phase 5: Clustering
// ---------------------------------------------------------------------------

/// Capture gas into adjacent groups or form new ones. Returns the number
/// of groups formed.
fn phase_clustering(automaton: &mut Automaton) -> u32 {
    let clustering = automaton.config.clustering;
    let torus = automaton.torus;
    let mut formed: u32 = 0;

    // Only agents bound before the scan capture gas, so absorption does
    // not chain through agents captured earlier in the same pass.
    let captors_at_start: BTreeSet<AgentId> = automaton
        .agents
        .iter()
        .filter(|agent| agent.state.is_bound())
        .map(|agent| agent.id)
        .collect();

    for (position, id) in automaton.front.iter() {
        if automaton.agents.state_of(*id) != CellState::Gas {
            continue;
        }

        // Absorption into a bound neighbour's group.
        let mut captors = torus
            .neighborhood(position, clustering.absorb_radius)
            .filter_map(|neighbor| {
                let occupant = automaton.front.get(neighbor.position)?;
                if !captors_at_start.contains(occupant) {
                    return None;
                }
                let agent = automaton.agents.get(*occupant)?;
                agent
                    .group
                    .filter(|group| automaton.groups.get(group).is_some_and(Group::is_active))
            });
        let first = captors.next();
        let captor_count = first.map_or(0, |_| captors.count().saturating_add(1));
        if let Some(group_id) = first {
            if captor_count >= clustering.absorb_min_neighbors {
                if let Some(group) = automaton.groups.get_mut(&group_id) {
                    group.append(*id, &mut automaton.agents);
                }
                continue;
            }
        }

        // Formation from surrounding gas.
        let gas: Vec<AgentId> = torus
            .neighborhood(position, clustering.radius)
            .filter_map(|neighbor| automaton.front.get(neighbor.position).copied())
            .filter(|occupant| automaton.agents.state_of(*occupant) == CellState::Gas)
            .collect();
        if gas.len() <= clustering.proto_size {
            continue;
        }

        let group_id = automaton.registry.allocate_id();
        let mut group = Group::new(group_id, automaton.config.lifecycle);
        group.append(*id, &mut automaton.agents);
        for member in gas {
            group.append(member, &mut automaton.agents);
        }
        if let Some(center) = group.calculate_center(&automaton.agents) {
            automaton.registry.insert(group_id, center);
        }
        debug!(group = %group_id, size = group.size(), %position, "Group formed");
        automaton.groups.insert(group_id, group);
        formed = formed.saturating_add(1);
    }
    formed
}

// ---------------------------------------------------------------------------
// Phase 6: Merge
// ---------------------------------------------------------------------------

/// Fuse groups whose bound members touch. Returns the number of groups
/// absorbed.
fn phase_merge(automaton: &mut Automaton) -> u32 {
    let torus = automaton.torus;
    let positions: Vec<_> = torus.positions().collect();
    let mut merged: u32 = 0;

    for position in positions {
        let Some(id) = automaton.front.get(position).copied() else {
            continue;
        };
        let neighbors: Vec<AgentId> = torus
            .neighborhood(position, MERGE_RADIUS)
            .filter_map(|neighbor| automaton.front.get(neighbor.position).copied())
            .collect();
        for other in neighbors {
            // Re-read each time: an earlier merge may have moved `id`.
            let own = active_group_of(automaton, id);
            let theirs = active_group_of(automaton, other);
            let (Some(own), Some(theirs)) = (own, theirs) else {
                continue;
            };
            if own == theirs {
                continue;
            }
            if merge_pair(automaton, own, theirs) {
                merged = merged.saturating_add(1);
            }
        }
    }
    merged
}

/// Active group of a bound agent.
fn active_group_of(automaton: &Automaton, id: AgentId) -> Option<GroupId> {
    let agent = automaton.agents.get(id)?;
    if !agent.state.is_bound() {
        return None;
    }
    let group = agent.group?;
    automaton.group(group).map(|g| g.id)
}

/// Merge two active groups. The winner has the higher state, then the
/// larger size, then the lower handle.
fn merge_pair(automaton: &mut Automaton, a: GroupId, b: GroupId) -> bool {
    let (Some(ga), Some(gb)) = (automaton.groups.get(&a), automaton.groups.get(&b)) else {
        return false;
    };
    let a_wins = (ga.state, ga.size(), core::cmp::Reverse(ga.id))
        > (gb.state, gb.size(), core::cmp::Reverse(gb.id));
    let (winner_id, loser_id) = if a_wins { (a, b) } else { (b, a) };

    let Some(mut loser) = automaton.groups.remove(&loser_id) else {
        return false;
    };
    if let Some(winner) = automaton.groups.get_mut(&winner_id) {
        winner.merge(&mut loser, &mut automaton.agents);
        debug!(winner = %winner_id, loser = %loser_id, size = winner.size(), "Groups merged");
    }
    automaton.registry.remove(loser_id);
    automaton.groups.insert(loser_id, loser);
    true
}

// ---------------------------------------------------------------------------
// Phase 7: Lifecycle
// ---------------------------------------------------------------------------

/// Drop merged and completed groups from the group table.
fn compact(automaton: &mut Automaton) {
    automaton.groups.retain(|_, group| group.is_active());
}

/// Recompute the cached centroid of every registered forming group.
fn refresh_registry(automaton: &mut Automaton) {
    for group in automaton.groups.values() {
        if group.state != CellState::Forming {
            continue;
        }
        if let Some(center) = group.calculate_center(&automaton.agents) {
            automaton.registry.refresh(group.id, center);
        }
    }
}

/// Advance every active group. Forming groups within the proximity
/// distance of a group about to ignite ignite with it.
fn phase_lifecycle(automaton: &mut Automaton) -> LifecycleResult {
    let mut result = LifecycleResult::default();

    let mut forced: BTreeSet<GroupId> = BTreeSet::new();
    if let Some(distance) = automaton.config.clustering.proximity_distance {
        for group in automaton.groups.values().filter(|g| g.ignition_due()) {
            forced.extend(automaton.registry.within(automaton.torus, group.id, distance));
        }
    }

    for group in automaton.groups.values_mut() {
        match group.update(&mut automaton.agents, forced.contains(&group.id)) {
            GroupTransition::Unchanged => {}
            GroupTransition::Ignited => {
                automaton.registry.remove(group.id);
                result.ignited = result.ignited.saturating_add(1);
                info!(
                    tick = automaton.tick,
                    group = %group.id,
                    size = group.size(),
                    "Star ignited"
                );
            }
            GroupTransition::Dissipated { center } => {
                automaton.registry.remove(group.id);
                result.dissipated = result.dissipated.saturating_add(1);
                info!(
                    tick = automaton.tick,
                    group = %group.id,
                    %center,
                    "Star dissipated"
                );
            }
        }
    }
    result
}
