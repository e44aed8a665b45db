use super::config::MoveConfig;
use rand::Rng;
use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use std::fmt;

/// The kinds of box move the updater can attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveCategory {
    Volume,
    Length,
    Shear,
}

impl MoveCategory {
    pub const ALL: [MoveCategory; 3] = [MoveCategory::Volume, MoveCategory::Length, MoveCategory::Shear];

    pub fn as_str(&self) -> &'static str {
        match self {
            MoveCategory::Volume => "volume",
            MoveCategory::Length => "length",
            MoveCategory::Shear => "shear",
        }
    }
}

impl fmt::Display for MoveCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Picks a move category with probability proportional to its weight.
///
/// Exactly one random number is consumed per selection. When every weight is
/// zero no category can be picked and no number is consumed.
#[derive(Debug, Clone)]
pub struct MoveSelector {
    index: Option<WeightedIndex<f64>>,
}

impl MoveSelector {
    pub fn new(moves: &MoveConfig) -> Self {
        let index = match WeightedIndex::new(moves.weights()) {
            Ok(index) => Some(index),
            Err(WeightedError::AllWeightsZero) => None,
            Err(e) => {
                // Weights are validated non-negative and finite on the way in.
                tracing::warn!("Move weights rejected ({}); box moves are disabled", e);
                None
            }
        };
        Self { index }
    }

    /// `true` if at least one category has a positive weight.
    pub fn is_active(&self) -> bool {
        self.index.is_some()
    }

    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<MoveCategory> {
        self.index
            .as_ref()
            .map(|index| MoveCategory::ALL[index.sample(rng)])
    }
}
