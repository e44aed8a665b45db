use boxmc::engine::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 100;

/// Running tally of box updates seen during the current task.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct UpdateTally {
    updates: u64,
    accepted: u64,
    volume: Option<f64>,
}

impl UpdateTally {
    fn record(&mut self, volume: f64, accepted: bool) {
        self.updates += 1;
        if accepted {
            self.accepted += 1;
        }
        self.volume = Some(volume);
    }

    fn status_line(&self) -> String {
        match self.volume {
            Some(volume) if self.updates > 0 => format!(
                "V = {:.4}  acc = {:.1}%",
                volume,
                100.0 * self.accepted as f64 / self.updates as f64
            ),
            _ => String::from("waiting for first update"),
        }
    }
}

struct RunDisplay {
    bar: ProgressBar,
    tally: UpdateTally,
}

/// Renders workflow [`Progress`] events as a terminal progress bar.
///
/// The bar message tracks the current box volume and the acceptance rate of
/// box updates since the task started.
#[derive(Clone)]
pub struct CliProgressHandler {
    display: Arc<Mutex<RunDisplay>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr())
            .with_style(Self::spinner_style());
        bar.finish_and_clear();

        Self {
            display: Arc::new(Mutex::new(RunDisplay {
                bar,
                tally: UpdateTally::default(),
            })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let display = self.display.clone();

        Box::new(move |progress: Progress| {
            let Ok(mut guard) = display.lock() else {
                warn!("Progress display mutex was poisoned; dropping event.");
                return;
            };
            let RunDisplay { bar, tally } = &mut *guard;

            match progress {
                Progress::PhaseStart { name } => {
                    bar.reset();
                    bar.set_length(0);
                    bar.set_style(Self::spinner_style());
                    bar.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                    bar.set_message(name);
                }
                Progress::PhaseFinish => {
                    bar.disable_steady_tick();
                    bar.finish_with_message(format!("✓ Done ({})", tally.status_line()));
                }
                Progress::TaskStart { total_steps } => {
                    *tally = UpdateTally::default();
                    bar.disable_steady_tick();
                    bar.reset();
                    bar.set_length(total_steps);
                    bar.set_style(Self::bar_style());
                    bar.set_message(tally.status_line());
                }
                Progress::TaskIncrement => bar.inc(1),
                Progress::BoxUpdated {
                    volume, accepted, ..
                } => {
                    tally.record(volume, accepted);
                    bar.set_message(tally.status_line());
                }
                Progress::TaskFinish => {
                    if let Some(len) = bar.length() {
                        bar.set_position(len);
                    }
                    bar.finish();
                }
                Progress::Message(msg) => {
                    if bar.is_finished() {
                        bar.set_message(msg);
                    } else {
                        bar.println(format!("  {}", msg));
                    }
                }
            }
        })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>8}/{len:8} {rate} | {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .with_key("rate", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
            let _ = write!(w, "{:.0} steps/s", state.per_sec());
        })
        .progress_chars("=> ")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
