use crate::core::models::box_dim::BoxDim;
use thiserror::Error;

const AXES: [&str; 3] = ["x", "y", "z"];

/// Why a candidate box was refused before any particle was moved.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum InvalidBox {
    #[error("edge length along {axis} is not a positive finite number ({length})")]
    NonPositiveLength { axis: &'static str, length: f64 },

    #[error("tilt factors are not finite")]
    NonFiniteTilt,

    #[error("edge length along {axis} ({length}) is below twice the interaction cutoff ({min})")]
    BelowCutoff {
        axis: &'static str,
        length: f64,
        min: f64,
    },

    #[error("box is too sheared: plane spacing along {axis} ({distance}) is below {min}")]
    Degenerate {
        axis: &'static str,
        distance: f64,
        min: f64,
    },
}

/// Cheap geometric screening of candidate boxes.
///
/// A box passes when every active edge is a positive finite length of at
/// least twice the interaction cutoff, and the distance between opposite
/// faces along every axis is also at least that large. The second condition
/// is what catches boxes sheared so far that the minimum image is ambiguous.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxValidityChecker {
    min_width: f64,
}

impl BoxValidityChecker {
    pub fn new(interaction_cutoff: f64) -> Self {
        Self {
            min_width: 2.0 * interaction_cutoff.max(0.0),
        }
    }

    pub fn min_width(&self) -> f64 {
        self.min_width
    }

    pub fn check(&self, candidate: &BoxDim) -> Result<(), InvalidBox> {
        let active = candidate.dimensions().count();
        let lengths = candidate.lengths();

        for (axis, &length) in AXES.into_iter().zip(&lengths).take(active) {
            if !(length.is_finite() && length > 0.0) {
                return Err(InvalidBox::NonPositiveLength { axis, length });
            }
        }
        if candidate.tilts().iter().any(|t| !t.is_finite()) {
            return Err(InvalidBox::NonFiniteTilt);
        }
        for (axis, &length) in AXES.into_iter().zip(&lengths).take(active) {
            if length < self.min_width {
                return Err(InvalidBox::BelowCutoff {
                    axis,
                    length,
                    min: self.min_width,
                });
            }
        }
        let distances = candidate.nearest_plane_distances();
        for (axis, &distance) in AXES.into_iter().zip(&distances).take(active) {
            if !(distance.is_finite() && distance >= self.min_width) {
                return Err(InvalidBox::Degenerate {
                    axis,
                    distance,
                    min: self.min_width,
                });
            }
        }
        Ok(())
    }

    pub fn is_valid(&self, candidate: &BoxDim) -> bool {
        self.check(candidate).is_ok()
    }
}
