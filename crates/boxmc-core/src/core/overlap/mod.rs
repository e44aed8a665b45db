//! Overlap evaluation against a candidate box.
//!
//! The box updater never inspects particle shapes itself. It asks an
//! [`OverlapOracle`] whether the rescaled configuration is allowed, once per
//! trial, and turns the answer into an [`EnergyChange`].

pub mod hard_sphere;

use crate::core::models::box_dim::BoxDim;
use nalgebra::Point3;

/// The change in (β-scaled) potential energy caused by a trial move.
///
/// Hard-particle systems only ever produce [`EnergyChange::Zero`] or
/// [`EnergyChange::Infinite`]; soft evaluators may return a finite value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnergyChange {
    /// No energy change; the trial is allowed by the interactions.
    Zero,
    /// An overlap; the trial must be rejected.
    Infinite,
    /// A finite change `β·ΔU`.
    Finite(f64),
}

impl EnergyChange {
    pub fn is_infinite(&self) -> bool {
        matches!(self, EnergyChange::Infinite)
    }

    /// Returns the exponent `-β·ΔU` the change contributes to the acceptance
    /// weight, or `None` when the change forbids the move.
    pub fn boltzmann_exponent(&self) -> Option<f64> {
        match *self {
            EnergyChange::Zero => Some(0.0),
            EnergyChange::Infinite => None,
            EnergyChange::Finite(beta_du) if beta_du.is_nan() => None,
            EnergyChange::Finite(beta_du) => Some(-beta_du),
        }
    }
}

/// Decides whether a configuration is allowed in a candidate box.
///
/// Implementations may parallelise internally, but each call must evaluate
/// exactly the geometry passed in and must not cache results between calls.
pub trait OverlapOracle {
    /// Returns `true` if any pair of particles overlaps in `candidate`.
    fn check_overlap(&self, candidate: &BoxDim, positions: &[Point3<f64>]) -> bool;

    /// The largest distance at which two particles can interact.
    ///
    /// Boxes narrower than twice this distance break the minimum image
    /// convention and are rejected before the oracle is consulted.
    fn interaction_cutoff(&self) -> f64;

    /// Evaluates a trial configuration as an energy change.
    ///
    /// The default maps an overlap to [`EnergyChange::Infinite`] and anything
    /// else to [`EnergyChange::Zero`].
    fn energy_change(&self, candidate: &BoxDim, positions: &[Point3<f64>]) -> EnergyChange {
        if self.check_overlap(candidate, positions) {
            EnergyChange::Infinite
        } else {
            EnergyChange::Zero
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysOverlapping;

    impl OverlapOracle for AlwaysOverlapping {
        fn check_overlap(&self, _: &BoxDim, _: &[Point3<f64>]) -> bool {
            true
        }

        fn interaction_cutoff(&self) -> f64 {
            0.0
        }
    }

    #[test]
    fn boltzmann_exponent_is_negated_energy() {
        assert_eq!(EnergyChange::Zero.boltzmann_exponent(), Some(0.0));
        assert_eq!(EnergyChange::Finite(1.5).boltzmann_exponent(), Some(-1.5));
        assert_eq!(EnergyChange::Infinite.boltzmann_exponent(), None);
        assert_eq!(EnergyChange::Finite(f64::NAN).boltzmann_exponent(), None);
    }

    #[test]
    fn default_energy_change_maps_overlap_to_infinite() {
        let oracle = AlwaysOverlapping;
        let change = oracle.energy_change(&BoxDim::cube(1.0), &[]);
        assert!(change.is_infinite());
    }
}
