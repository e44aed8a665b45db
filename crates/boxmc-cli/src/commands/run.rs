use crate::cli::RunArgs;
use crate::config::{AppConfig, PartialRunConfig, SystemSource};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use boxmc::{
    core::io::{
        box_log::{BoxLogRecord, BoxLogWriter},
        snapshot,
    },
    core::models::state::SimulationState,
    core::overlap::hard_sphere::HardSphereOracle,
    engine::{error::EngineError, progress::ProgressReporter},
    workflows::{self, npt::NptRunSummary},
};
use tracing::{info, warn};

pub fn run(args: RunArgs) -> Result<()> {
    let partial_config = PartialRunConfig::from_file(&args.config)?;
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args)?;

    let mut state = build_initial_state(&config)?;
    let oracle = HardSphereOracle::new(config.diameter);

    let overlaps = oracle.count_overlaps(state.box_dim(), state.particles().positions());
    if overlaps > 0 {
        warn!("Initial configuration has {} overlapping pair(s).", overlaps);
    }

    let mut box_log = match &config.box_log {
        Some(path) => {
            info!("Writing box log to {:?}", path);
            Some(BoxLogWriter::create(path).map_err(EngineError::from)?)
        }
        None => None,
    };

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Starting NPT box Monte Carlo: {} particles, {} steps...",
        state.particles().len(),
        config.run.steps
    );
    info!("Invoking the NPT workflow...");

    let summary = workflows::npt::run(
        &mut state,
        &config.run,
        &oracle,
        &config.pressure,
        &reporter,
        |record| {
            if let Some(writer) = box_log.as_mut() {
                writer.write(&BoxLogRecord::new(
                    record.timestep,
                    record.outcome.category_str(),
                    record.outcome.outcome_str(),
                    &record.box_dim,
                ))?;
            }
            Ok(())
        },
    )?;

    if let Some(writer) = box_log.as_mut() {
        writer.flush().map_err(EngineError::from)?;
    }

    if let Some(path) = &config.final_state {
        info!("Writing final state to {:?}", path);
        snapshot::save_state(path, &state).map_err(|e| CliError::FileParsing {
            path: path.clone(),
            source: e.into(),
        })?;
        println!("✓ Final state written to: {}", path.display());
    }

    print_summary(&summary);
    Ok(())
}

fn build_initial_state(config: &AppConfig) -> Result<SimulationState> {
    match &config.system {
        SystemSource::Lattice {
            dimensions,
            per_side,
            spacing,
            tilt,
        } => {
            info!(
                "Building {:?} lattice: {} per side, spacing {}",
                dimensions, per_side, spacing
            );
            let mut state = SimulationState::lattice(*dimensions, *per_side, *spacing)
                .map_err(EngineError::from)?;
            if tilt.iter().any(|t| *t != 0.0) {
                let tilted = state.box_dim().with_tilts(*tilt);
                state.rescale_into(tilted);
            }
            Ok(state)
        }
        SystemSource::Snapshot(path) => {
            info!("Loading initial state from {:?}", path);
            snapshot::load_state(path).map_err(|e| CliError::FileParsing {
                path: path.clone(),
                source: e.into(),
            })
        }
    }
}

fn print_summary(summary: &NptRunSummary) {
    let b = summary.final_box;
    println!("Run complete after {} box update(s).", summary.updates);
    println!(
        "  Final box: L = ({:.5}, {:.5}, {:.5}), tilt = ({:.5}, {:.5}, {:.5})",
        b.lx(),
        b.ly(),
        b.lz(),
        b.xy(),
        b.xz(),
        b.yz()
    );
    println!(
        "  Volume: {:.5} -> {:.5}",
        summary.initial_box.volume(),
        b.volume()
    );
    println!(
        "  Acceptance: volume {:.4}, length {:.4}, shear {:.4}",
        summary.volume_acceptance, summary.length_acceptance, summary.shear_acceptance
    );
    println!("  Total moves: {}", summary.counters.total_moves());
    if summary.counters.skipped > 0 {
        println!("  Skipped by move frequency: {}", summary.counters.skipped);
    }
}
