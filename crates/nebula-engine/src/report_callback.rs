//! Tick callback that logs progress at a fixed interval.

use nebula_core::automaton::Automaton;
use nebula_core::runner::TickCallback;
use nebula_core::tick::TickSummary;
use tracing::info;

/// Logs per-state counts every `interval` ticks and remembers the tick of
/// the first star.
pub struct ReportCallback {
    interval: u64,
    first_star: Option<u64>,
    peak_groups: usize,
}

impl ReportCallback {
    /// Report every `interval` ticks; zero disables the periodic report.
    pub const fn new(interval: u64) -> Self {
        Self {
            interval,
            first_star: None,
            peak_groups: 0,
        }
    }

    /// Tick on which a star was first seen.
    pub const fn first_star(&self) -> Option<u64> {
        self.first_star
    }

    /// Most active groups seen after any tick.
    pub const fn peak_groups(&self) -> usize {
        self.peak_groups
    }
}

impl TickCallback for ReportCallback {
    fn on_tick(&mut self, summary: &TickSummary, automaton: &Automaton) {
        self.peak_groups = self.peak_groups.max(summary.active_groups.len());

        if self.first_star.is_none() && summary.counts.star > 0 {
            self.first_star = Some(summary.tick);
            info!(tick = summary.tick, stars = summary.counts.star, "First star observed");
        }

        let due = summary
            .tick
            .checked_rem(self.interval)
            .is_some_and(|rem| rem == 0);
        if due {
            info!(
                tick = summary.tick,
                gas = summary.counts.gas,
                forming = summary.counts.forming,
                star = summary.counts.star,
                dissipating = summary.counts.dissipating,
                active_groups = summary.active_groups.len(),
                groups_formed_total = automaton.groups_formed_total(),
                "Progress"
            );
        }
    }
}
