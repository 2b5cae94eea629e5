//! Whole-run properties: determinism, structural invariants, topology,
//! and configuration validation.
//!
//! The runs use a small grid with low thresholds so formation, merging,
//! ignition, and dissipation all happen within a few dozen ticks.

#![allow(clippy::unwrap_used, clippy::panic)]

use nebula_core::{
    Automaton, AutomatonError, ConfigError, NoOpCallback, SimulationConfig, run_simulation,
};
use nebula_core::config::SimulationBoundsConfig;
use nebula_grid::{DensityMode, Torus};
use nebula_types::{CellState, Position};

fn busy_config(seed: u64) -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.world.size = 20;
    config.world.seed = seed;
    config.world.occupancy = vec![0.6, 0.4];
    config.density.radius = 2;
    config.clustering.radius = 2;
    config.clustering.proto_size = 6;
    config.clustering.proximity_distance = Some(5.0);
    config.lifecycle.formation_size = 10;
    config.lifecycle.star_duration = 3;
    config.lifecycle.dissipation_duration = 4;
    config.lifecycle.dissipation_steps = 3;
    config
}

#[test]
fn same_seed_gives_identical_runs() {
    let mut a = Automaton::new(busy_config(7)).unwrap();
    let mut b = Automaton::new(busy_config(7)).unwrap();
    assert_eq!(a.snapshot(), b.snapshot());
    for _ in 0..40 {
        assert_eq!(a.step(), b.step());
    }
}

#[test]
fn different_seeds_diverge() {
    let a = Automaton::new(busy_config(1)).unwrap();
    let b = Automaton::new(busy_config(2)).unwrap();
    assert_ne!(a.snapshot(), b.snapshot());
}

#[test]
fn invariants_hold_every_tick() {
    for mode in [DensityMode::Count, DensityMode::StateWeighted, DensityMode::InverseSquare] {
        let mut config = busy_config(11);
        config.density.mode = mode;
        let mut automaton = Automaton::new(config).unwrap();
        let gas_and_bound = |a: &Automaton| a.counts().occupied();
        let population = gas_and_bound(&automaton);

        for tick in 1..=80 {
            let summary = automaton.step();
            let violations = automaton.audit();
            assert!(
                violations.is_empty(),
                "{mode:?} tick {tick}: {violations:?}"
            );
            assert_eq!(summary.counts.total(), 400);
            assert_eq!(gas_and_bound(&automaton), population);
            for group in automaton.active_groups() {
                assert_eq!(group.size(), group.members().len());
                assert!(group.size() > 0);
            }
        }
    }
}

#[test]
fn busy_run_reaches_every_bound_state() {
    let mut automaton = Automaton::new(busy_config(3)).unwrap();
    let (mut forming, mut star, mut dissipating) = (false, false, false);
    for _ in 0..200 {
        let counts = automaton.step().counts;
        forming |= counts.forming > 0;
        star |= counts.star > 0;
        dissipating |= counts.dissipating > 0;
    }
    assert!(forming && star && dissipating);
}

#[test]
fn neighbourhood_wraps_around_corners() {
    let torus = Torus::new(10).unwrap();
    let around: Vec<Position> = torus
        .neighborhood(Position::new(0, 0), 1)
        .map(|n| n.position)
        .collect();
    assert_eq!(around.len(), 8);
    assert!(around.contains(&Position::new(9, 9)));
    assert!(around.contains(&Position::new(0, 9)));
    assert!(around.contains(&Position::new(9, 0)));
    assert!(around.contains(&Position::new(1, 1)));
}

#[test]
fn centroid_is_stable_without_changes() {
    let mut config = SimulationConfig::default();
    config.world.size = 10;
    config.world.occupancy = vec![0.0, 1.0];
    let mut automaton = Automaton::new(config).unwrap();
    let id = automaton
        .seed_group(
            &[Position::new(0, 0), Position::new(0, 1), Position::new(1, 1)],
            CellState::Forming,
            0,
        )
        .unwrap();
    let group = automaton.group(id).unwrap();
    let first = group.calculate_center(automaton.agents());
    let second = group.calculate_center(automaton.agents());
    assert_eq!(first, second);
    assert_eq!(automaton.registry().center(id), first);
}

#[test]
fn snapshot_codes_match_states() {
    let mut automaton = Automaton::new(busy_config(5)).unwrap();
    for _ in 0..10 {
        automaton.step();
    }
    let snapshot = automaton.snapshot();
    let codes = snapshot.codes();
    assert_eq!(codes.len(), 400);
    for (code, state) in codes.iter().zip(snapshot.cells.iter()) {
        assert_eq!(*code, state.code());
        assert!(*code <= 4);
    }
    assert_eq!(snapshot.rows().len(), 20);
}

#[test]
fn run_ends_at_first_star() {
    let mut automaton = Automaton::new(busy_config(9)).unwrap();
    let bounds = SimulationBoundsConfig {
        max_ticks: 500,
        max_real_time_seconds: 0,
        stop_on_star: true,
    };
    let result = run_simulation(&mut automaton, &bounds, &mut NoOpCallback).unwrap();
    let summary = result.final_summary.unwrap();
    assert!(summary.counts.star > 0 || result.total_ticks == 500);
    assert_eq!(summary.tick, result.total_ticks);
}

fn rejected_field(config: SimulationConfig) -> &'static str {
    match Automaton::new(config) {
        Err(AutomatonError::Config {
            source: ConfigError::Invalid { field, .. },
        }) => field,
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[test]
fn invalid_configurations_are_rejected() {
    let mut zero_size = SimulationConfig::default();
    zero_size.world.size = 0;
    assert_eq!(rejected_field(zero_size), "world.size");

    let mut bad_occupancy = SimulationConfig::default();
    bad_occupancy.world.occupancy = vec![0.9, 0.3];
    assert_eq!(rejected_field(bad_occupancy), "world.occupancy");

    let mut wide_radius = SimulationConfig::default();
    wide_radius.world.size = 6;
    wide_radius.lifecycle.formation_size = 10;
    wide_radius.density.radius = 3;
    assert_eq!(rejected_field(wide_radius), "density.radius");

    let mut oversized = SimulationConfig::default();
    oversized.world.size = 10;
    oversized.lifecycle.formation_size = 101;
    assert_eq!(rejected_field(oversized), "lifecycle.formation_size");

    let mut no_burn = SimulationConfig::default();
    no_burn.lifecycle.star_duration = 0;
    assert_eq!(rejected_field(no_burn), "lifecycle.star_duration");

    let mut negative_reach = SimulationConfig::default();
    negative_reach.clustering.proximity_distance = Some(-1.0);
    assert_eq!(
        rejected_field(negative_reach),
        "clustering.proximity_distance"
    );
}

#[test]
fn yaml_overrides_defaults() {
    let config = SimulationConfig::parse(
        "world:\n  size: 16\n  seed: 3\n  occupancy: [0.7, 0.3]\nlifecycle:\n  formation_size: 12\n",
    )
    .unwrap();
    assert_eq!(config.world.size, 16);
    assert_eq!(config.lifecycle.formation_size, 12);
    assert_eq!(config.lifecycle.star_duration, 10);
    let automaton = Automaton::new(config).unwrap();
    assert_eq!(automaton.torus().size(), 16);
}
