use super::error::EngineError;
use nalgebra::Point3;

/// Copy of the particle positions taken before a trial.
///
/// The buffer is sized to the maximum particle capacity and only ever resized
/// between trials, through [`PositionBackup::resize`].
#[derive(Debug, Clone, Default)]
pub struct PositionBackup {
    buffer: Vec<Point3<f64>>,
    stored: usize,
}

impl PositionBackup {
    pub fn with_capacity(max_particles: usize) -> Self {
        Self {
            buffer: vec![Point3::origin(); max_particles],
            stored: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Number of positions held from the most recent [`store`](Self::store).
    pub fn stored(&self) -> usize {
        self.stored
    }

    /// Resizes the buffer to `max_particles`, but never below `live`.
    pub fn resize(&mut self, max_particles: usize, live: usize) {
        let target = max_particles.max(live);
        self.buffer.resize(target, Point3::origin());
        self.stored = self.stored.min(target);
    }

    pub fn store(&mut self, positions: &[Point3<f64>]) -> Result<(), EngineError> {
        if positions.len() > self.buffer.len() {
            return Err(EngineError::BackupUndersized {
                capacity: self.buffer.len(),
                required: positions.len(),
            });
        }
        self.buffer[..positions.len()].copy_from_slice(positions);
        self.stored = positions.len();
        Ok(())
    }

    pub fn restore_into(&self, positions: &mut [Point3<f64>]) -> Result<(), EngineError> {
        if positions.len() != self.stored {
            return Err(EngineError::Internal(format!(
                "Backup holds {} positions but {} are live",
                self.stored,
                positions.len()
            )));
        }
        positions.copy_from_slice(&self.buffer[..self.stored]);
        Ok(())
    }
}
