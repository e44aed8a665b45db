//! Time-dependent reduced pressure `β·P`.
//!
//! The pressure is a pure function of the timestep. Changing it during a run
//! breaks detailed balance for the steps where it changes; that is the
//! caller's choice, not something the updater guards against.

/// Supplies `β·P` at a given timestep.
pub trait PressureProvider {
    fn value_at(&self, timestep: u64) -> f64;
}

impl PressureProvider for f64 {
    fn value_at(&self, _timestep: u64) -> f64 {
        *self
    }
}

/// Linear interpolation of `β·P` between two timesteps, held constant outside them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearRamp {
    pub t_start: u64,
    pub t_end: u64,
    pub start: f64,
    pub end: f64,
}

impl PressureProvider for LinearRamp {
    fn value_at(&self, timestep: u64) -> f64 {
        if timestep <= self.t_start || self.t_end <= self.t_start {
            return if timestep >= self.t_end {
                self.end
            } else {
                self.start
            };
        }
        if timestep >= self.t_end {
            return self.end;
        }
        let fraction = (timestep - self.t_start) as f64 / (self.t_end - self.t_start) as f64;
        self.start + fraction * (self.end - self.start)
    }
}

/// The pressure schedules that can be described in a run configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PressureSchedule {
    Constant(f64),
    Ramp(LinearRamp),
}

impl PressureProvider for PressureSchedule {
    fn value_at(&self, timestep: u64) -> f64 {
        match self {
            PressureSchedule::Constant(value) => *value,
            PressureSchedule::Ramp(ramp) => ramp.value_at(timestep),
        }
    }
}
