use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use boxmc::core::models::box_dim::Dimensions;
use boxmc::core::pressure::{LinearRamp, PressureSchedule};
use boxmc::engine::config::{
    BoxMcConfigBuilder, LengthMove, NptRunConfig, ShearMove, VolumeMove,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_DIAMETER: f64 = 1.0;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct PartialSystemConfig {
    dimensions: Option<Dimensions>,
    #[serde(rename = "particles-per-side")]
    particles_per_side: Option<usize>,
    spacing: Option<f64>,
    diameter: Option<f64>,
    tilt: Option<[f64; 3]>,
    snapshot: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", tag = "type")]
enum PartialPressure {
    Constant {
        value: f64,
    },
    Ramp {
        #[serde(rename = "t-start")]
        t_start: u64,
        #[serde(rename = "t-end")]
        t_end: u64,
        start: f64,
        end: f64,
    },
}

impl From<PartialPressure> for PressureSchedule {
    fn from(p: PartialPressure) -> Self {
        match p {
            PartialPressure::Constant { value } => PressureSchedule::Constant(value),
            PartialPressure::Ramp {
                t_start,
                t_end,
                start,
                end,
            } => PressureSchedule::Ramp(LinearRamp {
                t_start,
                t_end,
                start,
                end,
            }),
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct PartialVolumeMove {
    delta: Option<f64>,
    weight: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct PartialLengthMove {
    delta: Option<[f64; 3]>,
    weight: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct PartialShearMove {
    delta: Option<[f64; 3]>,
    reduce: Option<f64>,
    weight: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct PartialMovesConfig {
    frequency: Option<f64>,
    volume: Option<PartialVolumeMove>,
    length: Option<PartialLengthMove>,
    shear: Option<PartialShearMove>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct PartialOutputConfig {
    #[serde(rename = "box-log")]
    box_log: Option<PathBuf>,
    #[serde(rename = "final-state")]
    final_state: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialRunConfig {
    seed: Option<u64>,
    steps: Option<u64>,
    period: Option<u64>,
    #[serde(rename = "start-timestep")]
    start_timestep: Option<u64>,
    system: Option<PartialSystemConfig>,
    pressure: Option<PartialPressure>,
    moves: Option<PartialMovesConfig>,
    output: Option<PartialOutputConfig>,
}

/// Where the initial configuration comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum SystemSource {
    Lattice {
        dimensions: Dimensions,
        per_side: usize,
        spacing: f64,
        tilt: [f64; 3],
    },
    Snapshot(PathBuf),
}

/// Fully resolved settings for one `run` invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub run: NptRunConfig,
    pub system: SystemSource,
    pub diameter: f64,
    pub pressure: PressureSchedule,
    pub box_log: Option<PathBuf>,
    pub final_state: Option<PathBuf>,
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value.parse().map_err(|_| {
        CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value))
    })
}

impl PartialRunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content, path)
    }

    fn from_toml_str(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn merge_with_cli(mut self, args: &RunArgs) -> Result<AppConfig> {
        self.apply_set_values(&args.set_values)?;

        let system = self.system.take().unwrap_or_default();
        let moves = self.moves.take().unwrap_or_default();
        let output = self.output.take().unwrap_or_default();

        let seed = args.seed.or(self.seed).ok_or_else(|| {
            CliError::Config(
                "A value for 'seed' is required either in the config file or via --seed."
                    .to_string(),
            )
        })?;
        let steps = args.steps.or(self.steps).ok_or_else(|| {
            CliError::Config(
                "A value for 'steps' is required either in the config file or via --steps."
                    .to_string(),
            )
        })?;
        let pressure: PressureSchedule = self
            .pressure
            .take()
            .ok_or_else(|| CliError::Config("`[pressure]` section is required.".to_string()))?
            .into();

        let source = Self::merge_system_source(&system)?;
        let diameter = system.diameter.unwrap_or(DEFAULT_DIAMETER);
        if !(diameter.is_finite() && diameter > 0.0) {
            return Err(CliError::Config(format!(
                "`system.diameter` must be positive, got {}",
                diameter
            )));
        }

        let volume = moves.volume.unwrap_or_default();
        let length = moves.length.unwrap_or_default();
        let shear = moves.shear.unwrap_or_default();
        let config_error = |e: boxmc::engine::config::ConfigError| CliError::Config(e.to_string());

        let mut builder = BoxMcConfigBuilder::new()
            .seed(seed)
            .steps(steps)
            .volume_move(
                VolumeMove::new(volume.delta.unwrap_or(0.0), volume.weight.unwrap_or(0.0))
                    .map_err(config_error)?,
            )
            .length_move(
                LengthMove::new(length.delta.unwrap_or([0.0; 3]), length.weight.unwrap_or(0.0))
                    .map_err(config_error)?,
            )
            .shear_move(
                ShearMove::new(
                    shear.delta.unwrap_or([0.0; 3]),
                    shear.reduce.unwrap_or(0.0),
                    shear.weight.unwrap_or(0.0),
                )
                .map_err(config_error)?,
            );
        if let Some(frequency) = moves.frequency {
            builder = builder.frequency(frequency);
        }
        if let Some(period) = self.period {
            builder = builder.period(period);
        }
        if let Some(start) = self.start_timestep {
            builder = builder.start_timestep(start);
        }
        let run = builder.build_run().map_err(config_error)?;

        Ok(AppConfig {
            run,
            system: source,
            diameter,
            pressure,
            box_log: args.box_log.clone().or(output.box_log),
            final_state: args.final_state.clone().or(output.final_state),
        })
    }

    fn merge_system_source(system: &PartialSystemConfig) -> Result<SystemSource> {
        if let Some(path) = &system.snapshot {
            if system.particles_per_side.is_some() || system.spacing.is_some() {
                return Err(CliError::Config(
                    "`system.snapshot` cannot be combined with a lattice description.".to_string(),
                ));
            }
            return Ok(SystemSource::Snapshot(path.clone()));
        }

        let per_side = system.particles_per_side.ok_or_else(|| {
            CliError::Config(
                "`system.particles-per-side` is required unless a snapshot is given.".to_string(),
            )
        })?;
        let spacing = system.spacing.ok_or_else(|| {
            CliError::Config("`system.spacing` is required unless a snapshot is given.".to_string())
        })?;
        Ok(SystemSource::Lattice {
            dimensions: system.dimensions.unwrap_or(Dimensions::Three),
            per_side,
            spacing,
            tilt: system.tilt.unwrap_or([0.0; 3]),
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            match key {
                "seed" => self.seed = Some(parse_value(key, value_str, "integer")?),
                "steps" => self.steps = Some(parse_value(key, value_str, "integer")?),
                "period" => self.period = Some(parse_value(key, value_str, "integer")?),
                "start-timestep" => {
                    self.start_timestep = Some(parse_value(key, value_str, "integer")?)
                }
                "system.particles-per-side" => {
                    self.system
                        .get_or_insert_with(Default::default)
                        .particles_per_side = Some(parse_value(key, value_str, "integer")?);
                }
                "system.spacing" => {
                    self.system.get_or_insert_with(Default::default).spacing =
                        Some(parse_value(key, value_str, "float")?);
                }
                "system.diameter" => {
                    self.system.get_or_insert_with(Default::default).diameter =
                        Some(parse_value(key, value_str, "float")?);
                }
                "pressure.value" => match &mut self.pressure {
                    Some(PartialPressure::Ramp { .. }) => {
                        return Err(CliError::Config(
                            "Cannot set 'pressure.value' on a ramp pressure.".to_string(),
                        ));
                    }
                    Some(PartialPressure::Constant { value }) => {
                        *value = parse_value(key, value_str, "float")?;
                    }
                    None => {
                        self.pressure = Some(PartialPressure::Constant {
                            value: parse_value(key, value_str, "float")?,
                        });
                    }
                },
                "moves.frequency" => {
                    self.moves_mut().frequency = Some(parse_value(key, value_str, "float")?);
                }
                "moves.volume.delta" => {
                    self.volume_mut().delta = Some(parse_value(key, value_str, "float")?);
                }
                "moves.volume.weight" => {
                    self.volume_mut().weight = Some(parse_value(key, value_str, "float")?);
                }
                "moves.length.weight" => {
                    self.length_mut().weight = Some(parse_value(key, value_str, "float")?);
                }
                "moves.shear.weight" => {
                    self.shear_mut().weight = Some(parse_value(key, value_str, "float")?);
                }
                "moves.shear.reduce" => {
                    self.shear_mut().reduce = Some(parse_value(key, value_str, "float")?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unknown or unsupported key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }

    fn moves_mut(&mut self) -> &mut PartialMovesConfig {
        self.moves.get_or_insert_with(Default::default)
    }

    fn volume_mut(&mut self) -> &mut PartialVolumeMove {
        self.moves_mut().volume.get_or_insert_with(Default::default)
    }

    fn length_mut(&mut self) -> &mut PartialLengthMove {
        self.moves_mut().length.get_or_insert_with(Default::default)
    }

    fn shear_mut(&mut self) -> &mut PartialShearMove {
        self.moves_mut().shear.get_or_insert_with(Default::default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use once_cell::sync::Lazy;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    static TEST_DIR: Lazy<TempDir> = Lazy::new(|| tempdir().expect("Failed to create temp dir"));

    const MINIMAL_CONFIG: &str = r#"
        seed = 42
        steps = 500

        [system]
        particles-per-side = 4
        spacing = 1.2

        [pressure]
        type = "constant"
        value = 2.0

        [moves.volume]
        delta = 0.5
        weight = 1.0
    "#;

    fn write_config_file(name: &str, content: &str) -> PathBuf {
        let file_path = TEST_DIR.path().join(name);
        fs::write(&file_path, content).unwrap();
        file_path
    }

    fn run_args(config_path: &Path, extra: &[&str]) -> RunArgs {
        let mut args = vec![
            "boxmc".to_string(),
            "run".to_string(),
            "-c".to_string(),
            config_path.to_str().unwrap().to_string(),
        ];
        args.extend(extra.iter().map(|s| s.to_string()));
        match Cli::parse_from(args).command {
            Commands::Run(args) => args,
        }
    }

    fn load_and_merge(name: &str, content: &str, extra: &[&str]) -> Result<AppConfig> {
        let path = write_config_file(name, content);
        let args = run_args(&path, extra);
        PartialRunConfig::from_file(&path)?.merge_with_cli(&args)
    }

    #[test]
    fn minimal_file_merges_with_defaults() {
        let config = load_and_merge("minimal.toml", MINIMAL_CONFIG, &[]).unwrap();

        assert_eq!(config.run.boxmc.seed, 42);
        assert_eq!(config.run.steps, 500);
        assert_eq!(config.run.period, 1);
        assert_eq!(config.run.boxmc.moves.weights(), [1.0, 0.0, 0.0]);
        assert_eq!(config.diameter, DEFAULT_DIAMETER);
        assert_eq!(config.pressure, PressureSchedule::Constant(2.0));
        assert_eq!(
            config.system,
            SystemSource::Lattice {
                dimensions: Dimensions::Three,
                per_side: 4,
                spacing: 1.2,
                tilt: [0.0; 3],
            }
        );
        assert_eq!(config.box_log, None);
    }

    #[test]
    fn cli_args_override_file_values() {
        let config = load_and_merge(
            "override.toml",
            MINIMAL_CONFIG,
            &["-n", "20", "--seed", "7", "--box-log", "out.csv"],
        )
        .unwrap();

        assert_eq!(config.run.steps, 20);
        assert_eq!(config.run.boxmc.seed, 7);
        assert_eq!(config.box_log, Some(PathBuf::from("out.csv")));
    }

    #[test]
    fn set_values_override_nested_keys() {
        let config = load_and_merge(
            "set.toml",
            MINIMAL_CONFIG,
            &[
                "-S",
                "moves.volume.delta=0.25",
                "-S",
                "moves.shear.weight=2.0",
                "-S",
                "pressure.value=3.5",
                "-S",
                "system.diameter=0.9",
            ],
        )
        .unwrap();

        assert_eq!(config.run.boxmc.moves.volume.delta, 0.25);
        assert_eq!(config.run.boxmc.moves.shear.weight, 2.0);
        assert_eq!(config.pressure, PressureSchedule::Constant(3.5));
        assert_eq!(config.diameter, 0.9);
    }

    #[test]
    fn move_frequency_is_read_from_moves_table_and_set_values() {
        let content = r#"
            seed = 3
            steps = 10

            [system]
            particles-per-side = 2
            spacing = 2.0

            [pressure]
            type = "constant"
            value = 1.0

            [moves]
            frequency = 0.4

            [moves.volume]
            delta = 0.1
            weight = 1.0
        "#;
        let config = load_and_merge("frequency.toml", content, &[]).unwrap();
        assert_eq!(config.run.boxmc.frequency, 0.4);

        let config =
            load_and_merge("frequency-set.toml", content, &["-S", "moves.frequency=0.0"]).unwrap();
        assert_eq!(config.run.boxmc.frequency, 0.0);

        let minimal = load_and_merge("frequency-default.toml", MINIMAL_CONFIG, &[]).unwrap();
        assert_eq!(minimal.run.boxmc.frequency, 1.0);
    }

    #[test]
    fn negative_frequency_is_a_config_error() {
        let result = load_and_merge(
            "frequency-negative.toml",
            MINIMAL_CONFIG,
            &["-S", "moves.frequency=-1.0"],
        );
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("frequency")));
    }

    #[test]
    fn overflowing_move_weights_are_a_config_error() {
        let content = r#"
            seed = 3
            steps = 10

            [system]
            particles-per-side = 2
            spacing = 2.0

            [pressure]
            type = "constant"
            value = 1.0

            [moves.volume]
            delta = 0.1
            weight = 1e308

            [moves.length]
            delta = [0.1, 0.1, 0.1]
            weight = 1e308
        "#;
        let result = load_and_merge("weights-overflow.toml", content, &[]);
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("weights")));
    }

    #[test]
    fn ramp_pressure_and_full_move_set_are_parsed() {
        let content = r#"
            seed = 1
            steps = 100
            period = 5

            [system]
            dimensions = "two"
            particles-per-side = 6
            spacing = 1.5
            tilt = [0.1, 0.0, 0.0]

            [pressure]
            type = "ramp"
            t-start = 0
            t-end = 100
            start = 1.0
            end = 4.0

            [moves.volume]
            delta = 0.3
            weight = 1.0

            [moves.length]
            delta = [0.05, 0.05, 0.0]
            weight = 1.0

            [moves.shear]
            delta = [0.02, 0.0, 0.0]
            reduce = 0.6
            weight = 0.5

            [output]
            box-log = "box.csv"
            final-state = "final.toml"
        "#;
        let config = load_and_merge("ramp.toml", content, &[]).unwrap();

        assert_eq!(config.run.period, 5);
        assert_eq!(
            config.pressure,
            PressureSchedule::Ramp(LinearRamp {
                t_start: 0,
                t_end: 100,
                start: 1.0,
                end: 4.0,
            })
        );
        assert_eq!(config.run.boxmc.moves.shear.reduce, 0.6);
        assert_eq!(config.final_state, Some(PathBuf::from("final.toml")));
        assert!(matches!(
            config.system,
            SystemSource::Lattice {
                dimensions: Dimensions::Two,
                ..
            }
        ));
    }

    #[test]
    fn snapshot_source_excludes_lattice_keys() {
        let content = r#"
            seed = 1
            steps = 10

            [system]
            snapshot = "start.toml"

            [pressure]
            type = "constant"
            value = 1.0
        "#;
        let config = load_and_merge("snapshot.toml", content, &[]).unwrap();
        assert_eq!(
            config.system,
            SystemSource::Snapshot(PathBuf::from("start.toml"))
        );

        let mixed = content.replace("snapshot = \"start.toml\"", "snapshot = \"s.toml\"\nspacing = 1.0");
        let result = load_and_merge("mixed.toml", &mixed, &[]);
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn missing_seed_is_reported() {
        let content = MINIMAL_CONFIG.replace("seed = 42", "");
        let result = load_and_merge("no_seed.toml", &content, &[]);
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("seed")));
    }

    #[test]
    fn negative_delta_is_a_config_error() {
        let result = load_and_merge(
            "negative.toml",
            MINIMAL_CONFIG,
            &["-S", "moves.volume.delta=-1.0"],
        );
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("volume.delta")));
    }

    #[test]
    fn zero_period_is_a_config_error() {
        let result = load_and_merge("period.toml", MINIMAL_CONFIG, &["-S", "period=0"]);
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn malformed_set_values_are_rejected() {
        assert!(matches!(
            load_and_merge("bad_set.toml", MINIMAL_CONFIG, &["-S", "seed"]),
            Err(CliError::Config(_))
        ));
        assert!(matches!(
            load_and_merge("bad_key.toml", MINIMAL_CONFIG, &["-S", "moves.twist=1"]),
            Err(CliError::Config(_))
        ));
        assert!(matches!(
            load_and_merge("bad_int.toml", MINIMAL_CONFIG, &["-S", "steps=lots"]),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let content = format!("{}\nbogus = 1\n", "seed = 1");
        let result = PartialRunConfig::from_toml_str(&content, Path::new("inline.toml"));
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}
