use super::config::MoveConfig;
use super::rng::symmetric;
use super::selector::MoveCategory;
use crate::core::models::box_dim::{BoxDim, Dimensions};
use rand::Rng;

/// Shape ratios held fixed by isotropic volume moves.
///
/// `a1 = Lx/Ly` and `a2 = Lx/Lz`. For 2-D boxes `a2` is fixed at 1 and unused.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectRatios {
    pub a1: f64,
    pub a2: f64,
}

impl AspectRatios {
    pub fn of(box_dim: &BoxDim) -> Self {
        let a2 = match box_dim.dimensions() {
            Dimensions::Two => 1.0,
            Dimensions::Three => box_dim.lx() / box_dim.lz(),
        };
        Self {
            a1: box_dim.lx() / box_dim.ly(),
            a2,
        }
    }
}

impl Default for AspectRatios {
    fn default() -> Self {
        Self { a1: 1.0, a2: 1.0 }
    }
}

/// Returns a box of the given volume (area in 2-D) with the given aspect ratios.
///
/// Tilt factors are carried over unchanged. A non-positive `volume` produces
/// non-positive or NaN lengths, which the validity check rejects.
pub fn box_for_volume(current: &BoxDim, aspect: &AspectRatios, volume: f64) -> BoxDim {
    match current.dimensions() {
        Dimensions::Two => {
            let lx = (aspect.a1 * volume).sqrt();
            current.with_lengths([lx, lx / aspect.a1, current.lz()])
        }
        Dimensions::Three => {
            let lx = (volume * aspect.a1 * aspect.a2).cbrt();
            current.with_lengths([lx, lx / aspect.a1, lx / aspect.a2])
        }
    }
}

/// Builds candidate boxes for each move category.
#[derive(Debug, Clone, Default)]
pub struct BoxTransformer {
    moves: MoveConfig,
    aspect: AspectRatios,
}

impl BoxTransformer {
    pub fn new(moves: MoveConfig, aspect: AspectRatios) -> Self {
        Self { moves, aspect }
    }

    pub fn moves(&self) -> &MoveConfig {
        &self.moves
    }

    pub fn aspect(&self) -> &AspectRatios {
        &self.aspect
    }

    pub(crate) fn set_moves(&mut self, moves: MoveConfig) {
        self.moves = moves;
    }

    pub(crate) fn set_aspect(&mut self, aspect: AspectRatios) {
        self.aspect = aspect;
    }

    /// Draws the move magnitudes for `category` and returns the candidate box.
    ///
    /// The current box is never modified. Only axes and tilts that exist in the
    /// box's dimensionality consume random numbers.
    pub fn propose<R: Rng + ?Sized>(
        &self,
        category: MoveCategory,
        current: &BoxDim,
        rng: &mut R,
    ) -> BoxDim {
        match category {
            MoveCategory::Volume => {
                let volume = current.volume() + symmetric(rng, self.moves.volume.delta);
                box_for_volume(current, &self.aspect, volume)
            }
            MoveCategory::Length => {
                let mut lengths = current.lengths();
                let active = current.dimensions().count();
                for (length, delta) in lengths.iter_mut().zip(self.moves.length.delta).take(active) {
                    *length += symmetric(rng, delta);
                }
                current.with_lengths(lengths)
            }
            MoveCategory::Shear => {
                let mut tilts = current.tilts();
                let active = if current.is_2d() { 1 } else { 3 };
                for (tilt, delta) in tilts.iter_mut().zip(self.moves.shear.delta).take(active) {
                    *tilt += symmetric(rng, delta);
                }
                current.with_tilts(tilts)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::{LengthMove, ShearMove, VolumeMove};
    use crate::engine::rng::step_rng;

    const TOLERANCE: f64 = 1e-10;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE * a.abs().max(b.abs()).max(1.0)
    }

    fn moves() -> MoveConfig {
        MoveConfig {
            volume: VolumeMove::new(0.5, 1.0).unwrap(),
            length: LengthMove::new([0.1, 0.2, 0.3], 1.0).unwrap(),
            shear: ShearMove::new([0.05, 0.05, 0.05], 0.0, 1.0).unwrap(),
        }
    }

    #[test]
    fn aspect_ratios_of_rectangular_box() {
        let b = BoxDim::new([4.0, 2.0, 4.0 / 3.0], [0.0; 3]);
        let aspect = AspectRatios::of(&b);
        assert!(f64_approx_equal(aspect.a1, 2.0));
        assert!(f64_approx_equal(aspect.a2, 3.0));
    }

    #[test]
    fn box_for_volume_hits_target_and_keeps_shape() {
        let b = BoxDim::new([4.0, 2.0, 4.0 / 3.0], [0.1, 0.0, 0.0]);
        let aspect = AspectRatios::of(&b);
        let next = box_for_volume(&b, &aspect, 20.0);
        assert!(f64_approx_equal(next.volume(), 20.0));
        assert!(f64_approx_equal(next.lx() / next.ly(), 2.0));
        assert!(f64_approx_equal(next.lx() / next.lz(), 3.0));
        assert_eq!(next.tilts(), b.tilts());
    }

    #[test]
    fn box_for_area_in_two_dimensions() {
        let b = BoxDim::new_2d(6.0, 3.0, 0.0);
        let aspect = AspectRatios::of(&b);
        let next = box_for_volume(&b, &aspect, 32.0);
        assert!(f64_approx_equal(next.volume(), 32.0));
        assert!(f64_approx_equal(next.lx(), 8.0));
        assert!(f64_approx_equal(next.ly(), 4.0));
        assert_eq!(next.lz(), 1.0);
    }

    #[test]
    fn volume_proposal_stays_within_delta() {
        let b = BoxDim::cube(10.0);
        let transformer = BoxTransformer::new(moves(), AspectRatios::of(&b));
        let mut rng = step_rng(5, 0);
        for _ in 0..200 {
            let next = transformer.propose(MoveCategory::Volume, &b, &mut rng);
            assert!((next.volume() - 1000.0).abs() <= 0.5 + TOLERANCE);
        }
    }

    #[test]
    fn length_proposal_perturbs_each_axis_within_its_delta() {
        let b = BoxDim::cube(10.0);
        let transformer = BoxTransformer::new(moves(), AspectRatios::of(&b));
        let mut rng = step_rng(6, 0);
        for _ in 0..200 {
            let next = transformer.propose(MoveCategory::Length, &b, &mut rng);
            assert!((next.lx() - 10.0).abs() <= 0.1);
            assert!((next.ly() - 10.0).abs() <= 0.2);
            assert!((next.lz() - 10.0).abs() <= 0.3);
            assert_eq!(next.tilts(), [0.0; 3]);
        }
    }

    #[test]
    fn shear_proposal_keeps_volume() {
        let b = BoxDim::new([5.0, 6.0, 7.0], [0.1, -0.2, 0.05]);
        let transformer = BoxTransformer::new(moves(), AspectRatios::of(&b));
        let mut rng = step_rng(7, 0);
        for _ in 0..200 {
            let next = transformer.propose(MoveCategory::Shear, &b, &mut rng);
            assert!(f64_approx_equal(next.volume(), b.volume()));
            assert_eq!(next.lengths(), b.lengths());
        }
    }

    #[test]
    fn two_dimensional_shear_only_touches_xy() {
        let b = BoxDim::new_2d(5.0, 5.0, 0.0);
        let transformer = BoxTransformer::new(moves(), AspectRatios::of(&b));
        let mut rng = step_rng(8, 0);
        let next = transformer.propose(MoveCategory::Shear, &b, &mut rng);
        assert_eq!(next.xz(), 0.0);
        assert_eq!(next.yz(), 0.0);
        assert!(next.xy().abs() <= 0.05);
    }
}
