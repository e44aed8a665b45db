use crate::core::models::box_dim::BoxDim;
use crate::core::models::state::{SimulationState, StateError};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("Failed to serialize snapshot: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Snapshot describes an invalid state: {0}")]
    State(#[from] StateError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ParticleRecord {
    position: [f64; 3],
    #[serde(default)]
    image: [i32; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Snapshot {
    #[serde(rename = "box")]
    box_dim: BoxDim,
    #[serde(default)]
    particles: Vec<ParticleRecord>,
}

impl From<&SimulationState> for Snapshot {
    fn from(state: &SimulationState) -> Self {
        let particles = state
            .particles()
            .positions()
            .iter()
            .zip(state.particles().images())
            .map(|(r, n)| ParticleRecord {
                position: [r.x, r.y, r.z],
                image: [n.x, n.y, n.z],
            })
            .collect();
        Self {
            box_dim: *state.box_dim(),
            particles,
        }
    }
}

/// Serializes a state (box, positions, image flags) to a TOML string.
pub fn to_toml_string(state: &SimulationState) -> Result<String, SnapshotError> {
    Ok(toml::to_string(&Snapshot::from(state))?)
}

/// Parses a state from a TOML string. Particles are wrapped into the box.
pub fn from_toml_str(content: &str, path: &Path) -> Result<SimulationState, SnapshotError> {
    let snapshot: Snapshot = toml::from_str(content).map_err(|e| SnapshotError::Parse {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    let (positions, images): (Vec<_>, Vec<_>) = snapshot
        .particles
        .into_iter()
        .map(|p| (Point3::from(p.position), Vector3::from(p.image)))
        .unzip();
    Ok(SimulationState::from_parts(
        snapshot.box_dim,
        positions,
        images,
    )?)
}

pub fn save_state(path: &Path, state: &SimulationState) -> Result<(), SnapshotError> {
    let content = to_toml_string(state)?;
    std::fs::write(path, content).map_err(|e| SnapshotError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })
}

pub fn load_state(path: &Path) -> Result<SimulationState, SnapshotError> {
    let content = std::fs::read_to_string(path).map_err(|e| SnapshotError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    from_toml_str(&content, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::box_dim::Dimensions;
    use tempfile::tempdir;

    #[test]
    fn saved_state_loads_back_identically() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.toml");
        let mut state = SimulationState::lattice(Dimensions::Three, 2, 1.5).unwrap();
        state.rescale_into(BoxDim::new([3.2, 3.1, 3.0], [0.2, -0.1, 0.05]));

        save_state(&path, &state).unwrap();
        let loaded = load_state(&path).unwrap();

        assert_eq!(loaded.box_dim(), state.box_dim());
        assert_eq!(loaded.particles().len(), 8);
        for (a, b) in loaded
            .particles()
            .positions()
            .iter()
            .zip(state.particles().positions())
        {
            assert!((a - b).norm() < 1e-12);
        }
    }

    #[test]
    fn handwritten_snapshot_is_accepted() {
        let content = r#"
            [box]
            lx = 4.0
            ly = 4.0
            lz = 1.0
            xy = 0.0
            xz = 0.0
            yz = 0.0
            dimensions = "two"

            [[particles]]
            position = [0.5, 0.5, 0.0]

            [[particles]]
            position = [3.0, -1.0, 0.0]
        "#;
        let state = from_toml_str(content, Path::new("inline.toml")).unwrap();
        assert!(state.box_dim().is_2d());
        assert_eq!(state.particles().len(), 2);
        assert_eq!(state.particles().images()[1], Vector3::new(1, 0, 0));
    }

    #[test]
    fn invalid_box_is_reported_as_state_error() {
        let content = r#"
            [box]
            lx = -1.0
            ly = 4.0
            lz = 4.0
            xy = 0.0
            xz = 0.0
            yz = 0.0
            dimensions = "three"
        "#;
        let result = from_toml_str(content, Path::new("bad.toml"));
        assert!(matches!(result, Err(SnapshotError::State(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let result = load_state(&dir.path().join("nope.toml"));
        assert!(matches!(result, Err(SnapshotError::Io { .. })));
    }
}
