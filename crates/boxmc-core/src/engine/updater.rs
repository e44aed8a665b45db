use super::acceptance::AcceptanceRule;
use super::backup::PositionBackup;
use super::config::{BoxMcConfig, ConfigError, LengthMove, MoveConfig, ShearMove, VolumeMove};
use super::counters::{BoxMcCounters, CounterMode, StatsCounters};
use super::error::EngineError;
use super::rng::{step_rng, unit};
use super::selector::{MoveCategory, MoveSelector};
use super::transaction::{RejectReason, TrialExecutor, TrialVerdict};
use super::transform::{AspectRatios, BoxTransformer};
use crate::core::models::box_dim::BoxDim;
use crate::core::models::state::SimulationState;
use crate::core::overlap::OverlapOracle;
use crate::core::pressure::PressureProvider;
use tracing::{debug, info, instrument, trace, warn};

/// A component that advances the simulation state by one timestep.
///
/// Updaters are sequenced by the caller, which lends each one exclusive
/// access to the state in turn.
pub trait Updater {
    fn name(&self) -> &'static str;

    fn advance(&mut self, state: &mut SimulationState, timestep: u64) -> Result<(), EngineError>;
}

/// What a single box update did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrialOutcome {
    /// All move weights are zero; nothing was attempted.
    NoMove,
    /// The frequency draw skipped this step.
    Skipped,
    Accepted(MoveCategory),
    Rejected {
        category: MoveCategory,
        reason: RejectReason,
    },
}

impl TrialOutcome {
    pub fn category(&self) -> Option<MoveCategory> {
        match self {
            TrialOutcome::NoMove | TrialOutcome::Skipped => None,
            TrialOutcome::Accepted(category) => Some(*category),
            TrialOutcome::Rejected { category, .. } => Some(*category),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, TrialOutcome::Accepted(_))
    }

    pub fn category_str(&self) -> &'static str {
        self.category().map_or("none", |c| c.as_str())
    }

    pub fn outcome_str(&self) -> &'static str {
        match self {
            TrialOutcome::NoMove => "none",
            TrialOutcome::Skipped => "skipped",
            TrialOutcome::Accepted(_) => "accepted",
            TrialOutcome::Rejected { reason, .. } => reason.as_str(),
        }
    }
}

const LOG_QUANTITIES: [&str; 6] = [
    "volume_acceptance",
    "length_acceptance",
    "shear_acceptance",
    "total_moves",
    "volume",
    "beta_p",
];

/// Monte Carlo box updater for the isothermal-isobaric ensemble.
///
/// Each update picks one of the volume, length or shear moves by weight,
/// builds a candidate box, and runs a single trial against the overlap oracle.
/// A rejected trial leaves the state exactly as it was; an accepted shear that
/// leaves the box oversheared is followed by lattice reduction.
pub struct BoxMcUpdater<'a, O: OverlapOracle + ?Sized> {
    seed: u64,
    frequency: f64,
    pressure: &'a dyn PressureProvider,
    executor: TrialExecutor<'a, O>,
    transformer: BoxTransformer,
    selector: MoveSelector,
    backup: PositionBackup,
    stats: StatsCounters,
    last_volume: f64,
    last_outcome: Option<TrialOutcome>,
}

impl<'a, O: OverlapOracle + ?Sized> BoxMcUpdater<'a, O> {
    /// Creates an updater for `state`.
    ///
    /// The aspect ratios used by volume moves are taken from the current box,
    /// and the position backup is sized to the state's particle capacity.
    pub fn new(
        config: &BoxMcConfig,
        oracle: &'a O,
        pressure: &'a dyn PressureProvider,
        state: &SimulationState,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let transformer = BoxTransformer::new(config.moves, AspectRatios::of(state.box_dim()));
        Ok(Self {
            seed: config.seed,
            frequency: config.frequency,
            pressure,
            executor: TrialExecutor::new(oracle),
            selector: MoveSelector::new(&config.moves),
            transformer,
            backup: PositionBackup::with_capacity(state.particles().max_capacity()),
            stats: StatsCounters::new(),
            last_volume: state.box_dim().volume(),
            last_outcome: None,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn moves(&self) -> &MoveConfig {
        self.transformer.moves()
    }

    pub fn aspect_ratios(&self) -> &AspectRatios {
        self.transformer.aspect()
    }

    pub fn backup_capacity(&self) -> usize {
        self.backup.capacity()
    }

    pub fn last_outcome(&self) -> Option<TrialOutcome> {
        self.last_outcome
    }

    fn apply_moves(&mut self, moves: MoveConfig) -> Result<(), ConfigError> {
        moves.validate()?;
        self.selector = MoveSelector::new(&moves);
        self.transformer.set_moves(moves);
        Ok(())
    }

    /// Sets the probability that a step attempts a box move. On error the
    /// previous value is kept.
    pub fn set_frequency(&mut self, frequency: f64) -> Result<(), ConfigError> {
        let config = BoxMcConfig {
            seed: self.seed,
            moves: *self.moves(),
            frequency,
        };
        config.validate()?;
        self.frequency = frequency;
        Ok(())
    }

    /// Sets the volume move and recomputes the aspect ratios from `current`.
    ///
    /// On error the previous configuration is kept.
    pub fn set_volume_move(
        &mut self,
        delta: f64,
        weight: f64,
        current: &BoxDim,
    ) -> Result<(), ConfigError> {
        let volume = VolumeMove::new(delta, weight)?;
        let moves = MoveConfig {
            volume,
            ..*self.moves()
        };
        self.apply_moves(moves)?;
        self.compute_aspect_ratios(current);
        Ok(())
    }

    pub fn set_length_move(&mut self, delta: [f64; 3], weight: f64) -> Result<(), ConfigError> {
        let length = LengthMove::new(delta, weight)?;
        let moves = MoveConfig {
            length,
            ..*self.moves()
        };
        self.apply_moves(moves)
    }

    pub fn set_shear_move(
        &mut self,
        delta: [f64; 3],
        reduce: f64,
        weight: f64,
    ) -> Result<(), ConfigError> {
        let shear = ShearMove::new(delta, reduce, weight)?;
        let moves = MoveConfig {
            shear,
            ..*self.moves()
        };
        self.apply_moves(moves)
    }

    pub fn compute_aspect_ratios(&mut self, current: &BoxDim) {
        self.transformer.set_aspect(AspectRatios::of(current));
    }

    /// Resizes the position backup after the maximum particle count changed.
    ///
    /// Must be called before the next update whenever particles may have been
    /// added. The backup never shrinks below the `live` particle count.
    pub fn on_capacity_changed(&mut self, new_max: usize, live: usize) {
        if new_max < live {
            warn!(
                new_max,
                live, "Capacity below live particle count; keeping room for every live particle"
            );
        }
        debug!(
            old = self.backup.capacity(),
            new = new_max.max(live),
            "Resizing box-update position backup"
        );
        self.backup.resize(new_max, live);
    }

    /// Runs one box update at `timestep` and reports what happened.
    #[instrument(level = "trace", skip_all, fields(timestep = timestep))]
    pub fn step(
        &mut self,
        state: &mut SimulationState,
        timestep: u64,
    ) -> Result<TrialOutcome, EngineError> {
        self.stats.begin_step();
        let mut rng = step_rng(self.seed, timestep);

        if unit(&mut rng) >= self.frequency {
            self.stats.record_skipped();
            self.last_outcome = Some(TrialOutcome::Skipped);
            return Ok(TrialOutcome::Skipped);
        }

        let Some(category) = self.selector.select(&mut rng) else {
            self.stats.record_no_move();
            self.last_outcome = Some(TrialOutcome::NoMove);
            return Ok(TrialOutcome::NoMove);
        };

        let candidate = self.transformer.propose(category, state.box_dim(), &mut rng);
        let rule = match category {
            MoveCategory::Volume | MoveCategory::Length => AcceptanceRule::Isobaric {
                beta_p: self.pressure.value_at(timestep),
            },
            MoveCategory::Shear => AcceptanceRule::ShapeOnly,
        };

        let verdict =
            self.executor
                .execute(state, &mut self.backup, candidate, rule, &mut rng)?;

        let outcome = match verdict {
            TrialVerdict::Accepted => {
                if category == MoveCategory::Shear
                    && state.remove_overshear(self.moves().shear.reduce)
                {
                    trace!(tilts = ?state.box_dim().tilts(), "Lattice reduced after shear");
                }
                TrialOutcome::Accepted(category)
            }
            TrialVerdict::Rejected(reason) => TrialOutcome::Rejected { category, reason },
        };

        self.stats.record(category, outcome.is_accepted());
        self.last_volume = state.box_dim().volume();
        self.last_outcome = Some(outcome);
        trace!(
            category = category.as_str(),
            outcome = outcome.outcome_str(),
            volume = self.last_volume,
            "Box update finished"
        );
        Ok(outcome)
    }

    pub fn counters(&self, mode: CounterMode) -> BoxMcCounters {
        self.stats.get(mode)
    }

    /// Starts a new statistics window without losing the lifetime totals.
    pub fn reset_stats(&mut self) {
        self.stats.reset_run();
    }

    /// Logs the acceptance statistics of the current run window.
    pub fn log_stats(&self) {
        for line in self.stats_summary() {
            info!("{}", line);
        }
    }

    /// The lines written by [`log_stats`](Self::log_stats).
    pub fn stats_summary(&self) -> Vec<String> {
        let counters = self.counters(CounterMode::SinceRunStart);
        let mut lines = vec![String::from("-- Box MC stats:")];
        for category in MoveCategory::ALL {
            let tally = counters.tally(category);
            if let Some(ratio) = tally.acceptance() {
                lines.push(format!(
                    "Average {} acceptance: {:.4} ({} trials)",
                    category,
                    ratio,
                    tally.total()
                ));
            }
        }
        lines.push(format!("Total box changes: {}", counters.total_moves()));
        if counters.no_move > 0 {
            lines.push(format!("Updates with no enabled move: {}", counters.no_move));
        }
        if counters.skipped > 0 {
            lines.push(format!(
                "Updates skipped by move frequency: {}",
                counters.skipped
            ));
        }
        lines
    }

    pub fn provided_log_quantities(&self) -> &'static [&'static str] {
        &LOG_QUANTITIES
    }

    /// Resolves a named log quantity.
    ///
    /// Acceptance ratios and `total_moves` cover the current run window and
    /// are zero when nothing was attempted.
    pub fn log_value(&self, name: &str, timestep: u64) -> Result<f64, EngineError> {
        let counters = self.counters(CounterMode::SinceRunStart);
        let acceptance = |c: MoveCategory| counters.tally(c).acceptance().unwrap_or(0.0);
        match name {
            "volume_acceptance" => Ok(acceptance(MoveCategory::Volume)),
            "length_acceptance" => Ok(acceptance(MoveCategory::Length)),
            "shear_acceptance" => Ok(acceptance(MoveCategory::Shear)),
            "total_moves" => Ok(counters.total_moves() as f64),
            "volume" => Ok(self.last_volume),
            "beta_p" => Ok(self.pressure.value_at(timestep)),
            other => Err(EngineError::UnknownLogQuantity(other.to_string())),
        }
    }
}

impl<O: OverlapOracle + ?Sized> Updater for BoxMcUpdater<'_, O> {
    fn name(&self) -> &'static str {
        "box_mc"
    }

    fn advance(&mut self, state: &mut SimulationState, timestep: u64) -> Result<(), EngineError> {
        self.step(state, timestep).map(|_| ())
    }
}
