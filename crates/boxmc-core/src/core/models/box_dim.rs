use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Dimensionality of a periodic simulation cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Dimensions {
    /// A 2-D cell: only `Lx`, `Ly` and the `xy` tilt are meaningful, and the
    /// "volume" of the cell is its area.
    Two,
    /// A full 3-D triclinic cell.
    #[default]
    Three,
}

impl Dimensions {
    /// Returns the number of periodic axes (2 or 3).
    pub fn count(self) -> usize {
        match self {
            Dimensions::Two => 2,
            Dimensions::Three => 3,
        }
    }
}

/// A triclinic periodic cell described by three edge lengths and three tilt factors.
///
/// The lattice vectors are
///
/// ```text
/// a1 = (Lx, 0, 0)
/// a2 = (xy·Ly, Ly, 0)
/// a3 = (xz·Lz, yz·Lz, Lz)
/// ```
///
/// Tilt factors are dimensionless, so `xy·Ly` is the offset of `a2` along x.
/// The cell is centred on the origin: fractional coordinates of particles in the
/// primary image lie in `[-0.5, 0.5)` along every periodic axis. Because the box
/// matrix is upper triangular, the volume is always `Lx·Ly·Lz` regardless of tilt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BoxDim {
    lx: f64,
    ly: f64,
    lz: f64,
    xy: f64,
    xz: f64,
    yz: f64,
    dimensions: Dimensions,
}

impl BoxDim {
    /// Creates a 3-D triclinic box.
    ///
    /// # Arguments
    ///
    /// * `lengths` - Edge lengths `[Lx, Ly, Lz]`.
    /// * `tilts` - Tilt factors `[xy, xz, yz]`.
    pub fn new(lengths: [f64; 3], tilts: [f64; 3]) -> Self {
        Self {
            lx: lengths[0],
            ly: lengths[1],
            lz: lengths[2],
            xy: tilts[0],
            xz: tilts[1],
            yz: tilts[2],
            dimensions: Dimensions::Three,
        }
    }

    /// Creates a 2-D box. `Lz` is fixed at 1 and the out-of-plane tilts are zero.
    pub fn new_2d(lx: f64, ly: f64, xy: f64) -> Self {
        Self {
            lx,
            ly,
            lz: 1.0,
            xy,
            xz: 0.0,
            yz: 0.0,
            dimensions: Dimensions::Two,
        }
    }

    /// Creates a cubic 3-D box of edge `l`.
    pub fn cube(l: f64) -> Self {
        Self::new([l, l, l], [0.0; 3])
    }

    /// Creates a square 2-D box of edge `l`.
    pub fn square(l: f64) -> Self {
        Self::new_2d(l, l, 0.0)
    }

    pub fn lx(&self) -> f64 {
        self.lx
    }

    pub fn ly(&self) -> f64 {
        self.ly
    }

    pub fn lz(&self) -> f64 {
        self.lz
    }

    pub fn xy(&self) -> f64 {
        self.xy
    }

    pub fn xz(&self) -> f64 {
        self.xz
    }

    pub fn yz(&self) -> f64 {
        self.yz
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn is_2d(&self) -> bool {
        self.dimensions == Dimensions::Two
    }

    /// Returns the edge lengths `[Lx, Ly, Lz]`.
    pub fn lengths(&self) -> [f64; 3] {
        [self.lx, self.ly, self.lz]
    }

    /// Returns the tilt factors `[xy, xz, yz]`.
    pub fn tilts(&self) -> [f64; 3] {
        [self.xy, self.xz, self.yz]
    }

    /// Returns a copy of this box with new edge lengths and unchanged tilts.
    ///
    /// For 2-D boxes the third length is ignored and `Lz` stays at 1.
    pub fn with_lengths(&self, lengths: [f64; 3]) -> Self {
        let mut next = *self;
        next.lx = lengths[0];
        next.ly = lengths[1];
        if !self.is_2d() {
            next.lz = lengths[2];
        }
        next
    }

    /// Returns a copy of this box with new tilt factors and unchanged lengths.
    ///
    /// For 2-D boxes only `xy` is taken; `xz` and `yz` remain zero.
    pub fn with_tilts(&self, tilts: [f64; 3]) -> Self {
        let mut next = *self;
        next.xy = tilts[0];
        if !self.is_2d() {
            next.xz = tilts[1];
            next.yz = tilts[2];
        }
        next
    }

    /// Returns the cell volume, or the cell area for a 2-D box.
    pub fn volume(&self) -> f64 {
        match self.dimensions {
            Dimensions::Two => self.lx * self.ly,
            Dimensions::Three => self.lx * self.ly * self.lz,
        }
    }

    /// Returns lattice vector `i` (0, 1 or 2).
    ///
    /// # Panics
    ///
    /// Panics if `i > 2`.
    pub fn lattice_vector(&self, i: usize) -> Vector3<f64> {
        match i {
            0 => Vector3::new(self.lx, 0.0, 0.0),
            1 => Vector3::new(self.xy * self.ly, self.ly, 0.0),
            2 => Vector3::new(self.xz * self.lz, self.yz * self.lz, self.lz),
            _ => panic!("lattice vector index {} out of range", i),
        }
    }

    /// Converts a Cartesian position to fractional coordinates of this box.
    ///
    /// The box matrix is upper triangular, so this is a back substitution and
    /// never needs a general inverse. The z component is zero for 2-D boxes.
    pub fn to_fractional(&self, r: &Point3<f64>) -> Vector3<f64> {
        let sz = if self.is_2d() { 0.0 } else { r.z / self.lz };
        let sy = (r.y - self.yz * self.lz * sz) / self.ly;
        let sx = (r.x - self.xy * self.ly * sy - self.xz * self.lz * sz) / self.lx;
        Vector3::new(sx, sy, sz)
    }

    /// Converts fractional coordinates of this box back to a Cartesian position.
    pub fn from_fractional(&self, s: &Vector3<f64>) -> Point3<f64> {
        let sz = if self.is_2d() { 0.0 } else { s.z };
        Point3::new(
            self.lx * s.x + self.xy * self.ly * s.y + self.xz * self.lz * sz,
            self.ly * s.y + self.yz * self.lz * sz,
            self.lz * sz,
        )
    }

    /// Applies the minimum image convention to a separation vector.
    pub fn minimum_image(&self, d: &Vector3<f64>) -> Vector3<f64> {
        let mut s = self.to_fractional(&Point3::from(*d));
        for i in 0..self.dimensions.count() {
            s[i] -= s[i].round();
        }
        self.from_fractional(&s).coords
    }

    /// Wraps a position into the primary cell and updates its image flags.
    ///
    /// # Arguments
    ///
    /// * `r` - The position to wrap.
    /// * `image` - The current image flags of the particle.
    ///
    /// # Return
    ///
    /// The wrapped position and the image flags adjusted so that the unwrapped
    /// position is unchanged.
    pub fn wrap(&self, r: &Point3<f64>, image: &Vector3<i32>) -> (Point3<f64>, Vector3<i32>) {
        let mut s = self.to_fractional(r);
        let mut image = *image;
        for i in 0..self.dimensions.count() {
            let shift = (s[i] + 0.5).floor();
            if shift != 0.0 {
                s[i] -= shift;
                image[i] += shift as i32;
            }
        }
        (self.from_fractional(&s), image)
    }

    /// Returns the unwrapped position `r + n1·a1 + n2·a2 + n3·a3`.
    pub fn unwrap(&self, r: &Point3<f64>, image: &Vector3<i32>) -> Point3<f64> {
        let s = self.to_fractional(r) + image.map(f64::from);
        self.from_fractional(&s)
    }

    /// Returns the distances between opposite faces of the cell along each axis.
    ///
    /// For an orthorhombic box these equal the edge lengths; tilting the box
    /// brings the faces closer. For 2-D boxes the third entry is infinite.
    pub fn nearest_plane_distances(&self) -> [f64; 3] {
        let a1 = self.lattice_vector(0);
        let a2 = self.lattice_vector(1);
        match self.dimensions {
            Dimensions::Two => {
                let area = self.volume();
                [area / a2.norm(), area / a1.norm(), f64::INFINITY]
            }
            Dimensions::Three => {
                let a3 = self.lattice_vector(2);
                let v = self.volume();
                [
                    v / a2.cross(&a3).norm(),
                    v / a3.cross(&a1).norm(),
                    v / a1.cross(&a2).norm(),
                ]
            }
        }
    }

    /// Returns the shear of each tilt measured in lattice vectors, ordered `[xy, xz, yz]`.
    ///
    /// `xy` is the offset of `a2` along x divided by `Lx`, `xz` the offset of
    /// `a3` along x divided by `Lx`, and `yz` the offset of `a3` along y divided by `Ly`.
    pub fn shear_fractions(&self) -> [f64; 3] {
        [
            self.xy * self.ly / self.lx,
            self.xz * self.lz / self.lx,
            self.yz * self.lz / self.ly,
        ]
    }

    /// Returns `true` when any tilt exceeds `reduce` lattice vectors of shear.
    ///
    /// A shear of ±0.5 lattice vectors cannot be reduced, so thresholds below
    /// 0.5 disable the check entirely.
    pub fn is_oversheared(&self, reduce: f64) -> bool {
        if reduce < 0.5 {
            return false;
        }
        let fractions = self.shear_fractions();
        let active = if self.is_2d() { 1 } else { 3 };
        fractions[..active].iter().any(|f| f.abs() > reduce)
    }

    /// Re-expresses an oversheared box with an equivalent, less sheared set of lattice vectors.
    ///
    /// Whole lattice vectors are subtracted in the order `a3 - n·a2`, `a3 - m·a1`,
    /// `a2 - k·a1`, each only where the corresponding shear exceeds `reduce`.
    /// The resulting box spans the same periodic lattice.
    ///
    /// # Return
    ///
    /// `Some(reduced)` when a reduction was applied, `None` if the box was not
    /// oversheared.
    pub fn remove_overshear(&self, reduce: f64) -> Option<Self> {
        if !self.is_oversheared(reduce) {
            return None;
        }

        let mut next = *self;
        if !self.is_2d() {
            let yz_fraction = next.yz * next.lz / next.ly;
            if yz_fraction.abs() > reduce {
                let n = yz_fraction.round();
                next.yz -= n * next.ly / next.lz;
                next.xz -= n * next.xy * next.ly / next.lz;
            }

            let xz_fraction = next.xz * next.lz / next.lx;
            if xz_fraction.abs() > reduce {
                let m = xz_fraction.round();
                next.xz -= m * next.lx / next.lz;
            }
        }

        let xy_fraction = next.xy * next.ly / next.lx;
        if xy_fraction.abs() > reduce {
            let k = xy_fraction.round();
            next.xy -= k * next.lx / next.ly;
        }

        Some(next)
    }
}

impl Default for BoxDim {
    fn default() -> Self {
        Self::cube(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-10;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn points_approx_equal(a: &Point3<f64>, b: &Point3<f64>) -> bool {
        (a - b).norm() < TOLERANCE
    }

    #[test]
    fn volume_ignores_tilt_factors() {
        let b = BoxDim::new([2.0, 3.0, 4.0], [0.3, -0.2, 0.1]);
        assert!(f64_approx_equal(b.volume(), 24.0));
    }

    #[test]
    fn two_dimensional_volume_is_area() {
        let b = BoxDim::new_2d(2.0, 5.0, 0.4);
        assert!(f64_approx_equal(b.volume(), 10.0));
        assert_eq!(b.lz(), 1.0);
        assert_eq!(b.xz(), 0.0);
    }

    #[test]
    fn fractional_round_trip_recovers_cartesian_position() {
        let b = BoxDim::new([2.0, 3.0, 4.0], [0.3, -0.2, 0.1]);
        let r = Point3::new(0.7, -1.1, 1.3);
        let s = b.to_fractional(&r);
        assert!(points_approx_equal(&b.from_fractional(&s), &r));
    }

    #[test]
    fn lattice_vectors_have_unit_fractional_coordinates() {
        let b = BoxDim::new([2.0, 3.0, 4.0], [0.3, -0.2, 0.1]);
        for i in 0..3 {
            let s = b.to_fractional(&Point3::from(b.lattice_vector(i)));
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!(f64_approx_equal(s[j], expected));
            }
        }
    }

    #[test]
    fn minimum_image_folds_long_separations() {
        let b = BoxDim::cube(10.0);
        let d = b.minimum_image(&Vector3::new(9.0, -6.0, 0.5));
        assert!(f64_approx_equal(d.x, -1.0));
        assert!(f64_approx_equal(d.y, 4.0));
        assert!(f64_approx_equal(d.z, 0.5));
    }

    #[test]
    fn wrap_moves_position_into_primary_cell_and_counts_images() {
        let b = BoxDim::cube(10.0);
        let (r, image) = b.wrap(&Point3::new(6.0, -12.0, 0.0), &Vector3::zeros());
        assert!(points_approx_equal(&r, &Point3::new(-4.0, -2.0, 0.0)));
        assert_eq!(image, Vector3::new(1, -1, 0));
        assert!(points_approx_equal(
            &b.unwrap(&r, &image),
            &Point3::new(6.0, -12.0, 0.0)
        ));
    }

    #[test]
    fn nearest_plane_distances_match_lengths_for_orthorhombic_box() {
        let b = BoxDim::new([2.0, 3.0, 4.0], [0.0; 3]);
        let d = b.nearest_plane_distances();
        assert!(f64_approx_equal(d[0], 2.0));
        assert!(f64_approx_equal(d[1], 3.0));
        assert!(f64_approx_equal(d[2], 4.0));
    }

    #[test]
    fn tilting_reduces_nearest_plane_distance() {
        let b = BoxDim::new([10.0, 10.0, 10.0], [1.0, 0.0, 0.0]);
        let d = b.nearest_plane_distances();
        assert!(d[0] < 10.0);
        assert!(f64_approx_equal(d[0], 10.0 / 2.0_f64.sqrt()));
    }

    #[test]
    fn threshold_below_half_disables_overshear_detection() {
        let b = BoxDim::new([10.0, 10.0, 10.0], [0.9, 0.0, 0.0]);
        assert!(!b.is_oversheared(0.0));
        assert!(!b.is_oversheared(0.49));
        assert!(b.is_oversheared(0.5));
    }

    #[test]
    fn remove_overshear_reduces_xy_tilt_below_half() {
        let b = BoxDim::new([10.0, 10.0, 10.0], [0.6, 0.0, 0.0]);
        let reduced = b.remove_overshear(0.5).expect("box should be oversheared");
        assert!(reduced.xy().abs() < 0.5);
        assert!(f64_approx_equal(reduced.xy(), -0.4));
        assert!(f64_approx_equal(reduced.volume(), b.volume()));
    }

    #[test]
    fn remove_overshear_returns_none_for_reduced_box() {
        let b = BoxDim::new([10.0, 10.0, 10.0], [0.3, -0.2, 0.1]);
        assert!(b.remove_overshear(0.5).is_none());
    }

    #[test]
    fn reduced_lattice_vectors_are_integer_combinations_of_the_original() {
        let b = BoxDim::new([4.0, 5.0, 6.0], [0.9, -0.8, 0.7]);
        let reduced = b.remove_overshear(0.5).unwrap();
        for i in 0..3 {
            let s = b.to_fractional(&Point3::from(reduced.lattice_vector(i)));
            for j in 0..3 {
                assert!(f64_approx_equal(s[j], s[j].round()));
            }
        }
        for f in reduced.shear_fractions() {
            assert!(f.abs() <= 0.5 + TOLERANCE);
        }
    }

    #[test]
    fn two_dimensional_reduction_touches_only_xy() {
        let b = BoxDim::new_2d(8.0, 8.0, -0.7);
        let reduced = b.remove_overshear(0.5).unwrap();
        assert!(f64_approx_equal(reduced.xy(), 0.3));
        assert_eq!(reduced.xz(), 0.0);
        assert_eq!(reduced.yz(), 0.0);
    }

    #[test]
    fn with_lengths_keeps_lz_for_two_dimensional_boxes() {
        let b = BoxDim::square(3.0).with_lengths([4.0, 5.0, 7.0]);
        assert_eq!(b.lengths(), [4.0, 5.0, 1.0]);
    }
}
