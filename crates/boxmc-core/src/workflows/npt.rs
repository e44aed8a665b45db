use crate::core::models::box_dim::BoxDim;
use crate::core::models::state::SimulationState;
use crate::core::overlap::OverlapOracle;
use crate::core::pressure::PressureProvider;
use crate::engine::config::NptRunConfig;
use crate::engine::counters::{BoxMcCounters, CounterMode};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::updater::{BoxMcUpdater, TrialOutcome};
use tracing::{info, instrument, warn};

/// One invoked box update, handed to the caller's sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepRecord {
    pub timestep: u64,
    pub outcome: TrialOutcome,
    pub box_dim: BoxDim,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NptRunSummary {
    pub initial_box: BoxDim,
    pub final_box: BoxDim,
    /// Counters over this run only.
    pub counters: BoxMcCounters,
    /// Number of timesteps on which the box updater ran.
    pub updates: u64,
    pub volume_acceptance: f64,
    pub length_acceptance: f64,
    pub shear_acceptance: f64,
}

/// Advances `state` through `config.steps` timesteps of NPT box Monte Carlo.
///
/// The box updater runs on every timestep that is a multiple of
/// `config.period`; each run is passed to `on_update` as a [`StepRecord`].
/// An error from `on_update` stops the run.
#[instrument(skip_all, name = "npt_workflow", fields(steps = config.steps, period = config.period))]
pub fn run<O, F>(
    state: &mut SimulationState,
    config: &NptRunConfig,
    oracle: &O,
    pressure: &dyn PressureProvider,
    reporter: &ProgressReporter,
    mut on_update: F,
) -> Result<NptRunSummary, EngineError>
where
    O: OverlapOracle + ?Sized,
    F: FnMut(&StepRecord) -> Result<(), EngineError>,
{
    // === Phase 1: Preparation ===
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    let initial_box = *state.box_dim();
    info!(
        particles = state.particles().len(),
        volume = initial_box.volume(),
        "Preparing NPT run."
    );
    if oracle.check_overlap(&initial_box, state.particles().positions()) {
        warn!(
            "Initial configuration contains overlaps; every volume and length trial \
             will be rejected until a move removes them."
        );
        reporter.report(Progress::Message(
            "Warning: initial configuration has overlaps".to_string(),
        ));
    }

    let mut updater = BoxMcUpdater::new(&config.boxmc, oracle, pressure, state)?;
    updater.on_capacity_changed(
        state.particles().max_capacity(),
        state.particles().len(),
    );
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Box Monte Carlo ===
    reporter.report(Progress::PhaseStart {
        name: "Box Monte Carlo",
    });
    reporter.report(Progress::TaskStart {
        total_steps: config.steps,
    });

    let mut updates = 0;
    let end = config.start_timestep.saturating_add(config.steps);
    for timestep in config.start_timestep..end {
        if timestep % config.period == 0 {
            let outcome = updater.step(state, timestep)?;
            updates += 1;
            let record = StepRecord {
                timestep,
                outcome,
                box_dim: *state.box_dim(),
            };
            on_update(&record)?;
            if outcome.category().is_some() {
                reporter.report(Progress::BoxUpdated {
                    timestep,
                    volume: record.box_dim.volume(),
                    accepted: outcome.is_accepted(),
                });
            }
        }
        reporter.report(Progress::TaskIncrement);
    }

    reporter.report(Progress::TaskFinish);
    updater.log_stats();
    reporter.report(Progress::PhaseFinish);

    let summary = NptRunSummary {
        initial_box,
        final_box: *state.box_dim(),
        counters: updater.counters(CounterMode::SinceRunStart),
        updates,
        volume_acceptance: updater.log_value("volume_acceptance", end)?,
        length_acceptance: updater.log_value("length_acceptance", end)?,
        shear_acceptance: updater.log_value("shear_acceptance", end)?,
    };
    info!(
        updates = summary.updates,
        total_moves = summary.counters.total_moves(),
        final_volume = summary.final_box.volume(),
        "NPT run complete."
    );
    Ok(summary)
}
