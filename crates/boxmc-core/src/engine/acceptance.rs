//! Ensemble acceptance for box trials.

use crate::core::overlap::EnergyChange;

/// How a trial box is weighed once it is known to be overlap free.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AcceptanceRule {
    /// Volume-changing moves in the isothermal-isobaric ensemble at reduced pressure `beta_p`.
    Isobaric { beta_p: f64 },
    /// Volume-preserving moves; only the interaction energy matters.
    ShapeOnly,
}

/// Logarithm of the NPT weight ratio, `-βP·(V' - V) + N·ln(V'/V)`.
pub fn npt_log_weight(beta_p: f64, n: usize, v_old: f64, v_new: f64) -> f64 {
    -beta_p * (v_new - v_old) + n as f64 * (v_new / v_old).ln()
}

/// Returns the Metropolis probability of accepting a trial, in `[0, 1]`.
///
/// An infinite energy change, or any computation that produces NaN, gives 0.
pub fn acceptance_probability(
    rule: AcceptanceRule,
    n: usize,
    v_old: f64,
    v_new: f64,
    energy: EnergyChange,
) -> f64 {
    let Some(exponent) = energy.boltzmann_exponent() else {
        return 0.0;
    };
    let ln_acceptance = match rule {
        AcceptanceRule::Isobaric { beta_p } => npt_log_weight(beta_p, n, v_old, v_new) + exponent,
        AcceptanceRule::ShapeOnly => exponent,
    };
    if ln_acceptance.is_nan() {
        0.0
    } else if ln_acceptance >= 0.0 {
        1.0
    } else {
        ln_acceptance.exp()
    }
}
