use super::selector::MoveCategory;
use std::ops::Sub;

/// Accepted and rejected trial counts for one move category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveTally {
    pub accepted: u64,
    pub rejected: u64,
}

impl MoveTally {
    pub fn total(&self) -> u64 {
        self.accepted + self.rejected
    }

    /// Fraction of accepted trials, or `None` if nothing was attempted.
    pub fn acceptance(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.accepted as f64 / total as f64),
        }
    }
}

impl Sub for MoveTally {
    type Output = MoveTally;

    fn sub(self, rhs: Self) -> Self::Output {
        MoveTally {
            accepted: self.accepted.saturating_sub(rhs.accepted),
            rejected: self.rejected.saturating_sub(rhs.rejected),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoxMcCounters {
    pub volume: MoveTally,
    pub length: MoveTally,
    pub shear: MoveTally,
    /// Updates where every weight was zero and nothing was attempted.
    pub no_move: u64,
    /// Updates skipped by the move frequency draw.
    pub skipped: u64,
}

impl BoxMcCounters {
    pub fn tally(&self, category: MoveCategory) -> MoveTally {
        match category {
            MoveCategory::Volume => self.volume,
            MoveCategory::Length => self.length,
            MoveCategory::Shear => self.shear,
        }
    }

    fn tally_mut(&mut self, category: MoveCategory) -> &mut MoveTally {
        match category {
            MoveCategory::Volume => &mut self.volume,
            MoveCategory::Length => &mut self.length,
            MoveCategory::Shear => &mut self.shear,
        }
    }

    pub fn record(&mut self, category: MoveCategory, accepted: bool) {
        let tally = self.tally_mut(category);
        if accepted {
            tally.accepted += 1;
        } else {
            tally.rejected += 1;
        }
    }

    pub fn record_no_move(&mut self) {
        self.no_move += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    /// Accepted plus rejected trials over all categories. No-move and skipped
    /// updates are not counted.
    pub fn total_moves(&self) -> u64 {
        self.volume.total() + self.length.total() + self.shear.total()
    }

    pub fn total_accepted(&self) -> u64 {
        self.volume.accepted + self.length.accepted + self.shear.accepted
    }
}

impl Sub for BoxMcCounters {
    type Output = BoxMcCounters;

    fn sub(self, rhs: Self) -> Self::Output {
        BoxMcCounters {
            volume: self.volume - rhs.volume,
            length: self.length - rhs.length,
            shear: self.shear - rhs.shear,
            no_move: self.no_move.saturating_sub(rhs.no_move),
            skipped: self.skipped.saturating_sub(rhs.skipped),
        }
    }
}

/// Which window of the statistics to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CounterMode {
    /// Everything since the updater was created.
    Total,
    /// Since the last [`StatsCounters::reset_run`].
    #[default]
    SinceRunStart,
    /// Since the start of the current (or most recent) update.
    SinceStepStart,
}

/// Lifetime counters plus the two snapshots used for windowed reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsCounters {
    total: BoxMcCounters,
    run_start: BoxMcCounters,
    step_start: BoxMcCounters,
}

impl StatsCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_step(&mut self) {
        self.step_start = self.total;
    }

    /// Rebases the run window on the current totals. The lifetime totals are kept.
    pub fn reset_run(&mut self) {
        self.run_start = self.total;
        self.step_start = self.total;
    }

    pub fn record(&mut self, category: MoveCategory, accepted: bool) {
        self.total.record(category, accepted);
    }

    pub fn record_no_move(&mut self) {
        self.total.record_no_move();
    }

    pub fn record_skipped(&mut self) {
        self.total.record_skipped();
    }

    pub fn get(&self, mode: CounterMode) -> BoxMcCounters {
        match mode {
            CounterMode::Total => self.total,
            CounterMode::SinceRunStart => self.total - self.run_start,
            CounterMode::SinceStepStart => self.total - self.step_start,
        }
    }
}
