use super::acceptance::{AcceptanceRule, acceptance_probability};
use super::backup::PositionBackup;
use super::error::EngineError;
use super::rng::unit;
use super::validity::{BoxValidityChecker, InvalidBox};
use crate::core::models::box_dim::BoxDim;
use crate::core::models::state::SimulationState;
use crate::core::overlap::OverlapOracle;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectReason {
    /// The candidate failed the geometric screen; nothing was moved.
    InvalidBox(InvalidBox),
    /// The oracle reported an overlap in the candidate box.
    Overlap,
    /// The trial was overlap free but lost the Metropolis draw.
    Metropolis,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::InvalidBox(_) => "rejected-invalid",
            RejectReason::Overlap => "rejected-overlap",
            RejectReason::Metropolis => "rejected-metropolis",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrialVerdict {
    Accepted,
    Rejected(RejectReason),
}

/// Applies a candidate box to the state, evaluates it, and commits or rolls back.
///
/// After a rejected trial the box and every particle position are bit-identical
/// to what they were before the trial.
pub struct TrialExecutor<'a, O: OverlapOracle + ?Sized> {
    oracle: &'a O,
    validity: BoxValidityChecker,
}

impl<'a, O: OverlapOracle + ?Sized> TrialExecutor<'a, O> {
    pub fn new(oracle: &'a O) -> Self {
        Self {
            oracle,
            validity: BoxValidityChecker::new(oracle.interaction_cutoff()),
        }
    }

    pub fn oracle(&self) -> &'a O {
        self.oracle
    }

    pub fn validity(&self) -> &BoxValidityChecker {
        &self.validity
    }

    /// Runs one trial of `candidate` against `state`.
    ///
    /// One uniform number is drawn from `rng`, and only when the candidate is
    /// valid and overlap free.
    pub fn execute<R: Rng + ?Sized>(
        &self,
        state: &mut SimulationState,
        backup: &mut PositionBackup,
        candidate: BoxDim,
        rule: AcceptanceRule,
        rng: &mut R,
    ) -> Result<TrialVerdict, EngineError> {
        if let Err(reason) = self.validity.check(&candidate) {
            tracing::trace!("Candidate box rejected before trial: {}", reason);
            return Ok(TrialVerdict::Rejected(RejectReason::InvalidBox(reason)));
        }

        let n = state.particles().len();
        let v_old = state.box_dim().volume();
        let v_new = candidate.volume();

        Self::transaction(state, backup, |state| {
            state.rescale_into(candidate);
            let energy = self
                .oracle
                .energy_change(state.box_dim(), state.particles().positions());
            if energy.is_infinite() {
                return Ok(TrialVerdict::Rejected(RejectReason::Overlap));
            }

            let probability = acceptance_probability(rule, n, v_old, v_new, energy);
            if unit(rng) < probability {
                Ok(TrialVerdict::Accepted)
            } else {
                Ok(TrialVerdict::Rejected(RejectReason::Metropolis))
            }
        })
    }

    fn transaction<F>(
        state: &mut SimulationState,
        backup: &mut PositionBackup,
        action: F,
    ) -> Result<TrialVerdict, EngineError>
    where
        F: FnOnce(&mut SimulationState) -> Result<TrialVerdict, EngineError>,
    {
        // 1. Record the pre-trial box and positions.
        let original_box = *state.box_dim();
        backup.store(state.particles().positions())?;

        // 2. Execute the trial.
        let result = action(state);

        // 3. Anything short of an acceptance reverts to the recorded state.
        if !matches!(result, Ok(TrialVerdict::Accepted)) {
            state.restore_box(original_box);
            backup.restore_into(state.particles_mut().positions_mut())?;
        }

        result
    }
}
