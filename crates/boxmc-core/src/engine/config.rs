use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Parameter '{parameter}' must be non-negative, got {value}")]
    NegativeValue { parameter: &'static str, value: f64 },

    #[error("Parameter '{parameter}' must be finite")]
    NonFinite { parameter: &'static str },

    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
}

fn non_negative(parameter: &'static str, value: f64) -> Result<f64, ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NonFinite { parameter });
    }
    if value < 0.0 {
        return Err(ConfigError::NegativeValue { parameter, value });
    }
    Ok(value)
}

/// Isotropic volume moves: `V' = V + U(-delta, delta)` at fixed aspect ratios.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VolumeMove {
    pub delta: f64,
    pub weight: f64,
}

impl VolumeMove {
    pub fn new(delta: f64, weight: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            delta: non_negative("volume.delta", delta)?,
            weight: non_negative("volume.weight", weight)?,
        })
    }
}

/// Independent per-axis length moves `L_i' = L_i + U(-delta_i, delta_i)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LengthMove {
    pub delta: [f64; 3],
    pub weight: f64,
}

impl LengthMove {
    pub fn new(delta: [f64; 3], weight: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            delta: [
                non_negative("length.delta-lx", delta[0])?,
                non_negative("length.delta-ly", delta[1])?,
                non_negative("length.delta-lz", delta[2])?,
            ],
            weight: non_negative("length.weight", weight)?,
        })
    }
}

/// Independent tilt moves `t' = t + U(-delta_t, delta_t)` for `[xy, xz, yz]`.
///
/// `reduce` is the shear, in lattice vectors, beyond which lattice reduction is
/// applied after an accepted move. Values below 0.5 disable reduction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShearMove {
    pub delta: [f64; 3],
    pub reduce: f64,
    pub weight: f64,
}

impl ShearMove {
    pub fn new(delta: [f64; 3], reduce: f64, weight: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            delta: [
                non_negative("shear.delta-xy", delta[0])?,
                non_negative("shear.delta-xz", delta[1])?,
                non_negative("shear.delta-yz", delta[2])?,
            ],
            reduce: non_negative("shear.reduce", reduce)?,
            weight: non_negative("shear.weight", weight)?,
        })
    }
}

/// The full move set. A category with zero weight is never attempted.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MoveConfig {
    pub volume: VolumeMove,
    pub length: LengthMove,
    pub shear: ShearMove,
}

impl MoveConfig {
    /// Relative weights in `[volume, length, shear]` order.
    pub fn weights(&self) -> [f64; 3] {
        [self.volume.weight, self.length.weight, self.shear.weight]
    }

    /// Re-runs the per-move validation, for configs assembled field by field.
    /// The weights must also have a finite sum.
    pub fn validate(&self) -> Result<(), ConfigError> {
        VolumeMove::new(self.volume.delta, self.volume.weight)?;
        LengthMove::new(self.length.delta, self.length.weight)?;
        ShearMove::new(self.shear.delta, self.shear.reduce, self.shear.weight)?;
        let total: f64 = self.weights().iter().sum();
        if !total.is_finite() {
            return Err(ConfigError::InvalidValue {
                parameter: "weights",
                reason: format!("sum of move weights overflows ({})", total),
            });
        }
        Ok(())
    }
}

/// Box updates are attempted on every invoked step by default.
pub const DEFAULT_FREQUENCY: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxMcConfig {
    pub seed: u64,
    pub moves: MoveConfig,
    /// Probability that an invoked step attempts a box move at all.
    ///
    /// Each step draws `u` in `[0, 1)` and skips when `u >= frequency`, so 0
    /// never moves and any value of 1 or more always moves.
    pub frequency: f64,
}

impl BoxMcConfig {
    /// A configuration that attempts a move on every step.
    pub fn new(seed: u64, moves: MoveConfig) -> Self {
        Self {
            seed,
            moves,
            frequency: DEFAULT_FREQUENCY,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.moves.validate()?;
        non_negative("frequency", self.frequency)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NptRunConfig {
    pub boxmc: BoxMcConfig,
    /// Number of timesteps to advance.
    pub steps: u64,
    /// The box updater runs on timesteps that are multiples of `period`.
    pub period: u64,
    /// Timestep of the first step of the run.
    pub start_timestep: u64,
}

#[derive(Default)]
pub struct BoxMcConfigBuilder {
    seed: Option<u64>,
    volume: Option<VolumeMove>,
    length: Option<LengthMove>,
    shear: Option<ShearMove>,
    frequency: Option<f64>,
    steps: Option<u64>,
    period: Option<u64>,
    start_timestep: Option<u64>,
}

impl BoxMcConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn volume_move(mut self, mv: VolumeMove) -> Self {
        self.volume = Some(mv);
        self
    }
    pub fn length_move(mut self, mv: LengthMove) -> Self {
        self.length = Some(mv);
        self
    }
    pub fn shear_move(mut self, mv: ShearMove) -> Self {
        self.shear = Some(mv);
        self
    }
    pub fn frequency(mut self, frequency: f64) -> Self {
        self.frequency = Some(frequency);
        self
    }
    pub fn steps(mut self, steps: u64) -> Self {
        self.steps = Some(steps);
        self
    }
    pub fn period(mut self, period: u64) -> Self {
        self.period = Some(period);
        self
    }
    pub fn start_timestep(mut self, timestep: u64) -> Self {
        self.start_timestep = Some(timestep);
        self
    }

    /// Builds the updater configuration. Moves that were not set have zero weight.
    pub fn build(self) -> Result<BoxMcConfig, ConfigError> {
        let moves = MoveConfig {
            volume: self.volume.unwrap_or_default(),
            length: self.length.unwrap_or_default(),
            shear: self.shear.unwrap_or_default(),
        };
        let config = BoxMcConfig {
            seed: self.seed.ok_or(ConfigError::MissingParameter("seed"))?,
            moves,
            frequency: self.frequency.unwrap_or(DEFAULT_FREQUENCY),
        };
        config.validate()?;
        Ok(config)
    }

    /// Builds a run configuration; `steps` is required, `period` defaults to 1.
    pub fn build_run(self) -> Result<NptRunConfig, ConfigError> {
        let steps = self.steps.ok_or(ConfigError::MissingParameter("steps"))?;
        let period = self.period.unwrap_or(1);
        if period == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "period",
                reason: "must be at least 1".to_string(),
            });
        }
        let start_timestep = self.start_timestep.unwrap_or(0);
        Ok(NptRunConfig {
            boxmc: self.build()?,
            steps,
            period,
            start_timestep,
        })
    }
}
