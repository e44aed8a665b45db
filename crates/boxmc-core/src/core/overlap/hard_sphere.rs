use super::OverlapOracle;
use crate::core::models::box_dim::BoxDim;
use nalgebra::Point3;
use tracing::trace;

#[cfg(not(feature = "parallel"))]
use itertools::Itertools;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Monodisperse hard spheres (hard disks in 2-D) of a single diameter.
///
/// Every pair is tested under the minimum image convention. This is the
/// reference oracle used by the command-line front end and by tests; large
/// systems would plug in a cell-list or GPU oracle through the same trait.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HardSphereOracle {
    diameter: f64,
}

impl HardSphereOracle {
    pub fn new(diameter: f64) -> Self {
        Self { diameter }
    }

    pub fn diameter(&self) -> f64 {
        self.diameter
    }

    #[inline]
    fn pair_overlaps(
        &self,
        candidate: &BoxDim,
        a: &Point3<f64>,
        b: &Point3<f64>,
        diameter_sq: f64,
    ) -> bool {
        candidate.minimum_image(&(b - a)).norm_squared() < diameter_sq
    }

    /// Counts overlapping pairs. Used for diagnostics on initial configurations.
    pub fn count_overlaps(&self, candidate: &BoxDim, positions: &[Point3<f64>]) -> usize {
        let diameter_sq = self.diameter * self.diameter;
        let n = positions.len();

        #[cfg(not(feature = "parallel"))]
        let count = (0..n)
            .tuple_combinations()
            .filter(|&(i, j)| self.pair_overlaps(candidate, &positions[i], &positions[j], diameter_sq))
            .count();

        #[cfg(feature = "parallel")]
        let count = (0..n)
            .into_par_iter()
            .map(|i| {
                ((i + 1)..n)
                    .filter(|&j| {
                        self.pair_overlaps(candidate, &positions[i], &positions[j], diameter_sq)
                    })
                    .count()
            })
            .sum();

        count
    }
}

impl OverlapOracle for HardSphereOracle {
    fn check_overlap(&self, candidate: &BoxDim, positions: &[Point3<f64>]) -> bool {
        let diameter_sq = self.diameter * self.diameter;
        let n = positions.len();

        #[cfg(not(feature = "parallel"))]
        let overlap = (0..n)
            .tuple_combinations()
            .any(|(i, j)| self.pair_overlaps(candidate, &positions[i], &positions[j], diameter_sq));

        #[cfg(feature = "parallel")]
        let overlap = (0..n).into_par_iter().any(|i| {
            ((i + 1)..n)
                .any(|j| self.pair_overlaps(candidate, &positions[i], &positions[j], diameter_sq))
        });

        trace!(n, overlap, "Hard-sphere overlap check.");
        overlap
    }

    fn interaction_cutoff(&self) -> f64 {
        self.diameter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separated_spheres_do_not_overlap() {
        let oracle = HardSphereOracle::new(1.0);
        let positions = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.5, 0.0, 0.0)];
        assert!(!oracle.check_overlap(&BoxDim::cube(10.0), &positions));
        assert_eq!(oracle.count_overlaps(&BoxDim::cube(10.0), &positions), 0);
    }

    #[test]
    fn close_spheres_overlap() {
        let oracle = HardSphereOracle::new(1.0);
        let positions = [Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.9, 0.0)];
        assert!(oracle.check_overlap(&BoxDim::cube(10.0), &positions));
    }

    #[test]
    fn overlap_is_detected_across_the_periodic_boundary() {
        let oracle = HardSphereOracle::new(1.0);
        let positions = [Point3::new(-4.8, 0.0, 0.0), Point3::new(4.8, 0.0, 0.0)];
        assert!(oracle.check_overlap(&BoxDim::cube(10.0), &positions));
        assert!(!oracle.check_overlap(&BoxDim::cube(12.0), &positions));
    }

    #[test]
    fn count_overlaps_counts_each_pair_once() {
        let oracle = HardSphereOracle::new(1.0);
        let positions = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.5, 0.0, 0.0),
            Point3::new(0.0, 0.5, 0.0),
            Point3::new(3.0, 3.0, 3.0),
        ];
        assert_eq!(oracle.count_overlaps(&BoxDim::cube(10.0), &positions), 3);
    }

    #[test]
    fn touching_spheres_are_allowed() {
        let oracle = HardSphereOracle::new(1.0);
        let positions = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
        assert!(!oracle.check_overlap(&BoxDim::cube(10.0), &positions));
    }

    #[test]
    fn interaction_cutoff_is_the_diameter() {
        assert_eq!(HardSphereOracle::new(1.25).interaction_cutoff(), 1.25);
    }
}
