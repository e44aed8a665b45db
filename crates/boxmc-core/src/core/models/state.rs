use super::box_dim::{BoxDim, Dimensions};
use super::particles::ParticleData;
use nalgebra::{Point3, Vector3};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum StateError {
    #[error("Box edge lengths must be positive and finite, got {lengths:?}")]
    InvalidBox { lengths: [f64; 3] },

    #[error("A lattice needs at least one particle per side")]
    EmptyLattice,

    #[error("Lattice spacing must be positive and finite, got {0}")]
    InvalidSpacing(f64),

    #[error("Particle count mismatch: {positions} positions but {images} image flags")]
    ImageCountMismatch { positions: usize, images: usize },
}

/// The periodic cell together with the particles it contains.
///
/// This is the state the box updater mutates. It is owned by the caller and
/// lent to updaters one at a time, so no two updaters can touch the same
/// box or positions concurrently.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    box_dim: BoxDim,
    particles: ParticleData,
}

impl SimulationState {
    /// Creates a state, wrapping every particle into the primary cell.
    pub fn new(box_dim: BoxDim, mut particles: ParticleData) -> Result<Self, StateError> {
        let lengths = box_dim.lengths();
        let active = box_dim.dimensions().count();
        if lengths[..active].iter().any(|l| !(l.is_finite() && *l > 0.0)) {
            return Err(StateError::InvalidBox { lengths });
        }

        let (positions, images) = particles.positions_and_images_mut();
        for (r, image) in positions.iter_mut().zip(images.iter_mut()) {
            let (wrapped, wrapped_image) = box_dim.wrap(r, image);
            *r = wrapped;
            *image = wrapped_image;
        }

        Ok(Self {
            box_dim,
            particles,
        })
    }

    /// Builds a simple cubic (3-D) or square (2-D) lattice filling an orthorhombic box.
    ///
    /// # Arguments
    ///
    /// * `dimensions` - Whether to build a 2-D or 3-D lattice.
    /// * `per_side` - Number of lattice sites along each axis.
    /// * `spacing` - Distance between neighbouring sites; the box edge is `per_side * spacing`.
    pub fn lattice(
        dimensions: Dimensions,
        per_side: usize,
        spacing: f64,
    ) -> Result<Self, StateError> {
        if per_side == 0 {
            return Err(StateError::EmptyLattice);
        }
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(StateError::InvalidSpacing(spacing));
        }

        let edge = per_side as f64 * spacing;
        let offset = -0.5 * edge + 0.5 * spacing;
        let site = |i: usize| offset + i as f64 * spacing;

        let (box_dim, positions) = match dimensions {
            Dimensions::Two => {
                let mut positions = Vec::with_capacity(per_side * per_side);
                for i in 0..per_side {
                    for j in 0..per_side {
                        positions.push(Point3::new(site(i), site(j), 0.0));
                    }
                }
                (BoxDim::square(edge), positions)
            }
            Dimensions::Three => {
                let mut positions = Vec::with_capacity(per_side.pow(3));
                for i in 0..per_side {
                    for j in 0..per_side {
                        for k in 0..per_side {
                            positions.push(Point3::new(site(i), site(j), site(k)));
                        }
                    }
                }
                (BoxDim::cube(edge), positions)
            }
        };

        Self::new(box_dim, ParticleData::from_positions(positions))
    }

    /// Restores a state from raw parts, as read from a snapshot.
    pub fn from_parts(
        box_dim: BoxDim,
        positions: Vec<Point3<f64>>,
        images: Vec<Vector3<i32>>,
    ) -> Result<Self, StateError> {
        if positions.len() != images.len() {
            return Err(StateError::ImageCountMismatch {
                positions: positions.len(),
                images: images.len(),
            });
        }
        let mut particles = ParticleData::with_capacity(positions.len());
        for (r, image) in positions.into_iter().zip(images) {
            particles.push(r, image);
        }
        Self::new(box_dim, particles)
    }

    pub fn box_dim(&self) -> &BoxDim {
        &self.box_dim
    }

    pub fn particles(&self) -> &ParticleData {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut ParticleData {
        &mut self.particles
    }

    /// Replaces the box and maps every particle by the affine transform between
    /// the old and new cells, so fractional coordinates are unchanged.
    pub fn rescale_into(&mut self, new_box: BoxDim) {
        let old_box = self.box_dim;
        for r in self.particles.positions_mut() {
            let s = old_box.to_fractional(r);
            *r = new_box.from_fractional(&s);
        }
        self.box_dim = new_box;
    }

    /// Puts back a box without touching positions. Used when positions are
    /// restored separately from a backup.
    pub(crate) fn restore_box(&mut self, previous: BoxDim) {
        self.box_dim = previous;
    }

    /// Applies lattice reduction to an oversheared box.
    ///
    /// Particles keep their physical positions; each is re-wrapped into the new
    /// primary cell and its image flags rewritten so the unwrapped position is
    /// unchanged.
    ///
    /// # Return
    ///
    /// `true` if the box was reduced.
    pub fn remove_overshear(&mut self, reduce: f64) -> bool {
        let Some(reduced) = self.box_dim.remove_overshear(reduce) else {
            return false;
        };

        let old_box = self.box_dim;
        let (positions, images) = self.particles.positions_and_images_mut();
        for (r, image) in positions.iter_mut().zip(images.iter_mut()) {
            let unwrapped = old_box.unwrap(r, image);
            let (wrapped, _) = reduced.wrap(r, &Vector3::zeros());
            let shift = reduced.to_fractional(&Point3::from(unwrapped - wrapped));
            *image = shift.map(|s| s.round() as i32);
            *r = wrapped;
        }
        self.box_dim = reduced;
        true
    }
}
