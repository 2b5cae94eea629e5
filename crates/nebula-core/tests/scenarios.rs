//! Lifecycle scenarios driven through the public automaton API.
//!
//! Each test builds a small hand-placed grid, runs a single tick, and
//! checks one transition: formation, ignition, dissipation, release to
//! gas, and merging.

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use std::collections::BTreeSet;

use nebula_core::{Automaton, SimulationConfig};
use nebula_types::{AgentId, CellState, Position};

const SIZE: usize = 10;

fn config() -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.world.size = SIZE;
    config.clustering.radius = 2;
    config.clustering.proto_size = 10;
    config
}

fn grid_with(gas: impl Fn(usize, usize) -> bool) -> Vec<CellState> {
    (0..SIZE)
        .flat_map(|row| (0..SIZE).map(move |col| (row, col)))
        .map(|(row, col)| {
            if gas(row, col) {
                CellState::Gas
            } else {
                CellState::Empty
            }
        })
        .collect()
}

fn handles(automaton: &Automaton, positions: &[Position]) -> Vec<AgentId> {
    positions
        .iter()
        .map(|p| automaton.agent_at(*p).unwrap().id)
        .collect()
}

#[test]
fn dense_gas_region_forms_a_group() {
    let states = grid_with(|row, col| (2..8).contains(&row) && (2..8).contains(&col));
    let mut automaton = Automaton::from_states(config(), &states).unwrap();

    let summary = automaton.step();

    assert!(summary.groups_formed >= 1);
    let largest = summary
        .active_groups
        .iter()
        .filter(|g| g.state == CellState::Forming)
        .map(|g| g.size)
        .max()
        .unwrap();
    assert!(largest > 10, "largest forming group has {largest} members");
    assert!(summary.counts.forming >= 11);
    assert!(automaton.audit().is_empty());
}

#[test]
fn mature_forming_group_ignites() {
    let mut config = config();
    config.lifecycle.formation_size = 4;
    config.lifecycle.star_duration = 5;
    let block = [
        Position::new(4, 4),
        Position::new(4, 5),
        Position::new(5, 4),
        Position::new(5, 5),
    ];
    let states = grid_with(|row, col| (4..6).contains(&row) && (4..6).contains(&col));
    let mut automaton = Automaton::from_states(config, &states).unwrap();
    let id = automaton.seed_group(&block, CellState::Forming, 4).unwrap();
    let members = handles(&automaton, &block);

    let summary = automaton.step();

    assert_eq!(summary.groups_ignited, 1);
    let group = automaton.group(id).unwrap();
    assert_eq!(group.state, CellState::Star);
    assert_eq!(group.steps, 0);
    assert!(!automaton.registry().contains(id));
    for member in members {
        let agent = automaton.agents().get(member).unwrap();
        assert_eq!(agent.state, CellState::Star);
        assert_eq!(agent.group, Some(id));
    }
}

#[test]
fn burnt_out_star_dissipates() {
    let mut config = config();
    config.lifecycle.dissipation_duration = 6;
    let block: Vec<Position> = (4..7)
        .flat_map(|row| (4..7).map(move |col| Position::new(row, col)))
        .collect();
    let states = grid_with(|row, col| (4..7).contains(&row) && (4..7).contains(&col));
    let mut automaton = Automaton::from_states(config, &states).unwrap();
    let id = automaton.seed_group(&block, CellState::Star, 6).unwrap();
    let members = handles(&automaton, &block);

    let summary = automaton.step();

    assert_eq!(summary.groups_dissipated, 1);
    assert!(automaton.group(id).is_none());
    assert!(summary.active_groups.is_empty());
    assert_eq!(summary.counts.dissipating, 9);

    let centers: BTreeSet<Option<Position>> = members
        .iter()
        .map(|m| automaton.agents().get(*m).unwrap().center_group)
        .collect();
    assert_eq!(centers.len(), 1);
    let center = centers.into_iter().next().flatten().unwrap();
    // Dissipating agents have not moved since the transition, so their
    // positions still give the centroid rounded half up.
    let n = members.len();
    let (rows, cols) = members.iter().fold((0, 0), |(r, c), m| {
        let p = automaton.agents().get(*m).unwrap().position;
        (r + p.row, c + p.col)
    });
    assert_eq!(
        center,
        Position::new((2 * rows + n) / (2 * n), (2 * cols + n) / (2 * n))
    );
    for member in members {
        let agent = automaton.agents().get(member).unwrap();
        assert_eq!(agent.state, CellState::Dissipating);
        assert_eq!(agent.group, Some(id));
        assert_eq!(agent.days_dissipating, 0);
    }
}

#[test]
fn dissipating_agent_reverts_to_gas_on_open_grid() {
    let mut config = config();
    config.lifecycle.dissipation_steps = 4;
    let position = Position::new(3, 3);
    let states = grid_with(|row, col| row == 3 && col == 3);
    let mut automaton = Automaton::from_states(config, &states).unwrap();
    automaton
        .seed_dissipating(position, Position::new(5, 5), 3)
        .unwrap();
    let id = automaton.agent_at(position).unwrap().id;

    let summary = automaton.step();

    let agent = automaton.agents().get(id).unwrap();
    assert_eq!(agent.state, CellState::Gas);
    assert_eq!(agent.days_dissipating, 0);
    assert_eq!(agent.group, None);
    assert_eq!(agent.center_group, None);
    assert_eq!(summary.agents_released, 1);
    // Heading away from (5, 5) on an empty grid always succeeds.
    assert_eq!(agent.position, Position::new(2, 2));
}

#[test]
fn dissipating_agent_reverts_to_gas_when_blocked() {
    let mut config = config();
    config.lifecycle.dissipation_steps = 4;
    // Enough gas to fill every cell but too little per window to form.
    config.clustering.proto_size = 60;
    let position = Position::new(5, 5);
    let states = grid_with(|_, _| true);
    let mut automaton = Automaton::from_states(config, &states).unwrap();
    automaton
        .seed_dissipating(position, Position::new(2, 2), 3)
        .unwrap();
    let id = automaton.agent_at(position).unwrap().id;

    let summary = automaton.step();

    let agent = automaton.agents().get(id).unwrap();
    assert_eq!(agent.position, position);
    assert_eq!(agent.state, CellState::Gas);
    assert_eq!(agent.days_dissipating, 0);
    assert_eq!(summary.agents_moved, 0);
    assert_eq!(summary.counts.gas, 100);
}

#[test]
fn adjacent_forming_groups_merge_into_the_union() {
    let mut config = config();
    // A full grid keeps everyone in place; no gas may form or be absorbed.
    config.clustering.proto_size = 60;
    config.clustering.absorb_min_neighbors = 9;
    let states = grid_with(|_, _| true);
    let mut automaton = Automaton::from_states(config, &states).unwrap();

    let large = [
        Position::new(4, 2),
        Position::new(4, 3),
        Position::new(5, 3),
    ];
    let small = [Position::new(4, 4), Position::new(3, 4)];
    let large_id = automaton.seed_group(&large, CellState::Forming, 0).unwrap();
    let small_id = automaton.seed_group(&small, CellState::Forming, 0).unwrap();
    let expected: BTreeSet<AgentId> = handles(&automaton, &large)
        .into_iter()
        .chain(handles(&automaton, &small))
        .collect();

    let summary = automaton.step();

    assert_eq!(summary.groups_merged, 1);
    assert_eq!(summary.agents_moved, 0);
    assert!(automaton.group(small_id).is_none());
    assert!(!automaton.registry().contains(small_id));
    let winner = automaton.group(large_id).unwrap();
    assert_eq!(winner.members(), &expected);
    assert_eq!(winner.size(), 5);
    assert_eq!(winner.state, CellState::Forming);
    for member in &expected {
        assert_eq!(automaton.agents().get(*member).unwrap().group, Some(large_id));
    }
    assert!(automaton.audit().is_empty());
}

#[test]
fn gas_next_to_a_group_is_absorbed() {
    let mut config = config();
    config.clustering.proto_size = 60;
    config.clustering.absorb_min_neighbors = 1;
    let states = grid_with(|_, _| true);
    let mut automaton = Automaton::from_states(config, &states).unwrap();
    let id = automaton
        .seed_group(&[Position::new(4, 4)], CellState::Forming, 0)
        .unwrap();
    let neighbour = automaton.agent_at(Position::new(4, 5)).unwrap().id;
    let beyond = automaton.agent_at(Position::new(4, 6)).unwrap().id;

    let summary = automaton.step();

    assert_eq!(summary.groups_formed, 0);
    let joined = automaton.agents().get(neighbour).unwrap();
    assert_eq!(joined.group, Some(id));
    assert_eq!(joined.state, CellState::Forming);
    // Only the ring around the seed: later captures do not capture in turn.
    let group = automaton.group(id).unwrap();
    assert_eq!(group.size(), 9);
    assert_eq!(summary.counts.forming, 9);
    assert_eq!(summary.counts.gas, 91);
    assert_eq!(automaton.agents().get(beyond).unwrap().state, CellState::Gas);
    assert!(automaton.audit().is_empty());
}

#[test]
fn ready_group_ignites_its_near_neighbours() {
    let mut config = config();
    config.world.size = 20;
    config.clustering.proto_size = 60;
    config.clustering.absorb_min_neighbors = 9;
    config.clustering.proximity_distance = Some(10.0);
    config.lifecycle.formation_size = 3;
    config.lifecycle.star_duration = 5;
    let states = vec![CellState::Gas; 400];
    let mut automaton = Automaton::from_states(config, &states).unwrap();

    let ready = automaton
        .seed_group(
            &[Position::new(2, 2), Position::new(2, 3), Position::new(3, 2)],
            CellState::Forming,
            4,
        )
        .unwrap();
    // Centroids (2, 2) -> (8, 8) is 8.5 cells, (2, 2) -> (12, 12) is 14.1.
    let near = automaton
        .seed_group(&[Position::new(8, 8)], CellState::Forming, 0)
        .unwrap();
    let far = automaton
        .seed_group(&[Position::new(12, 12)], CellState::Forming, 0)
        .unwrap();

    let summary = automaton.step();

    assert_eq!(summary.groups_ignited, 2);
    assert_eq!(automaton.group(ready).unwrap().state, CellState::Star);
    assert_eq!(automaton.group(near).unwrap().state, CellState::Star);
    assert_eq!(automaton.group(far).unwrap().state, CellState::Forming);
    assert!(!automaton.registry().contains(ready));
    assert!(!automaton.registry().contains(near));
    assert!(automaton.registry().contains(far));
    assert_eq!(summary.counts.star, 4);
}

#[test]
fn star_absorbs_a_larger_forming_group() {
    let mut config = config();
    config.clustering.proto_size = 60;
    config.clustering.absorb_min_neighbors = 9;
    let states = grid_with(|_, _| true);
    let mut automaton = Automaton::from_states(config, &states).unwrap();

    let star = automaton
        .seed_group(&[Position::new(4, 4)], CellState::Star, 0)
        .unwrap();
    let forming_cells = [
        Position::new(4, 5),
        Position::new(4, 6),
        Position::new(5, 5),
    ];
    let forming = automaton
        .seed_group(&forming_cells, CellState::Forming, 0)
        .unwrap();
    let absorbed = handles(&automaton, &forming_cells);

    let summary = automaton.step();

    assert_eq!(summary.groups_merged, 1);
    assert!(automaton.group(forming).is_none());
    assert!(!automaton.registry().contains(forming));
    let winner = automaton.group(star).unwrap();
    assert_eq!(winner.state, CellState::Star);
    assert_eq!(winner.size(), 4);
    for member in absorbed {
        let agent = automaton.agents().get(member).unwrap();
        assert_eq!(agent.state, CellState::Star);
        assert_eq!(agent.group, Some(star));
    }
}
