use nalgebra::{Point3, Vector3};

const CAPACITY_GROWTH_FACTOR: f64 = 1.125;

/// Live particle positions and periodic image flags.
///
/// `max_capacity` is the number of particles the surrounding buffers must be
/// able to hold. It only grows when a push would exceed it, and every growth is
/// reported to the caller so that dependent buffers (such as the box updater's
/// position backup) can be resized before the next trial.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleData {
    positions: Vec<Point3<f64>>,
    images: Vec<Vector3<i32>>,
    max_capacity: usize,
}

impl ParticleData {
    /// Creates an empty particle set with room for `max_capacity` particles.
    pub fn with_capacity(max_capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(max_capacity),
            images: Vec::with_capacity(max_capacity),
            max_capacity,
        }
    }

    /// Creates a particle set from positions, all in image (0, 0, 0).
    pub fn from_positions(positions: Vec<Point3<f64>>) -> Self {
        let n = positions.len();
        Self {
            positions,
            images: vec![Vector3::zeros(); n],
            max_capacity: n,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    pub fn positions_mut(&mut self) -> &mut [Point3<f64>] {
        &mut self.positions
    }

    pub fn images(&self) -> &[Vector3<i32>] {
        &self.images
    }

    pub(crate) fn positions_and_images_mut(
        &mut self,
    ) -> (&mut [Point3<f64>], &mut [Vector3<i32>]) {
        (&mut self.positions, &mut self.images)
    }

    /// Appends a particle.
    ///
    /// # Return
    ///
    /// `Some(new_max)` when the maximum capacity had to grow, `None` otherwise.
    pub fn push(&mut self, position: Point3<f64>, image: Vector3<i32>) -> Option<usize> {
        let grown = self.reserve(self.len() + 1);
        self.positions.push(position);
        self.images.push(image);
        grown
    }

    /// Ensures the maximum capacity is at least `required`.
    ///
    /// Capacity grows geometrically so that a stream of single insertions does
    /// not trigger a resize on every call.
    ///
    /// # Return
    ///
    /// `Some(new_max)` when the maximum capacity grew, `None` otherwise.
    pub fn reserve(&mut self, required: usize) -> Option<usize> {
        if required <= self.max_capacity {
            return None;
        }
        let geometric = (self.max_capacity as f64 * CAPACITY_GROWTH_FACTOR).ceil() as usize;
        self.max_capacity = required.max(geometric);
        Some(self.max_capacity)
    }

    /// Removes the particle at `index` by swapping in the last one.
    ///
    /// The maximum capacity is never reduced.
    pub fn swap_remove(&mut self, index: usize) -> Option<(Point3<f64>, Vector3<i32>)> {
        if index >= self.len() {
            return None;
        }
        Some((
            self.positions.swap_remove(index),
            self.images.swap_remove(index),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_positions_sets_capacity_to_particle_count() {
        let particles = ParticleData::from_positions(vec![Point3::origin(); 4]);
        assert_eq!(particles.len(), 4);
        assert_eq!(particles.max_capacity(), 4);
        assert!(particles.images().iter().all(|i| *i == Vector3::zeros()));
    }

    #[test]
    fn push_within_capacity_reports_no_growth() {
        let mut particles = ParticleData::with_capacity(2);
        assert_eq!(particles.push(Point3::origin(), Vector3::zeros()), None);
        assert_eq!(particles.push(Point3::origin(), Vector3::zeros()), None);
        assert_eq!(particles.max_capacity(), 2);
    }

    #[test]
    fn push_beyond_capacity_reports_new_maximum() {
        let mut particles = ParticleData::with_capacity(8);
        for _ in 0..8 {
            particles.push(Point3::origin(), Vector3::zeros());
        }
        let grown = particles.push(Point3::origin(), Vector3::zeros());
        assert_eq!(grown, Some(9));
        assert_eq!(particles.max_capacity(), 9);

        let mut large = ParticleData::with_capacity(100);
        assert_eq!(large.reserve(101), Some(113));
    }

    #[test]
    fn swap_remove_keeps_capacity() {
        let mut particles = ParticleData::from_positions(vec![
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ]);
        let (removed, _) = particles.swap_remove(0).unwrap();
        assert_eq!(removed, Point3::new(1.0, 0.0, 0.0));
        assert_eq!(particles.positions()[0], Point3::new(2.0, 0.0, 0.0));
        assert_eq!(particles.max_capacity(), 2);
        assert!(particles.swap_remove(5).is_none());
    }
}
