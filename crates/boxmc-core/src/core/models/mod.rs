//! # Core Models Module
//!
//! Data structures describing the simulated system: the periodic cell, the
//! particles inside it, and the combined state that updaters mutate.
//!
//! ## Key Components
//!
//! - [`box_dim`] - Triclinic periodic cell (edge lengths and tilt factors), fractional
//!   coordinates, minimum image convention and lattice reduction
//! - [`particles`] - Particle positions, periodic image flags and maximum capacity
//! - [`state`] - The cell and its particles together, with affine rescaling and
//!   particle remapping after lattice reduction
//!
//! ## Usage
//!
//! ```ignore
//! use boxmc::core::models::{box_dim::Dimensions, state::SimulationState};
//!
//! let mut state = SimulationState::lattice(Dimensions::Three, 4, 1.5)?;
//! let bigger = state.box_dim().with_lengths([6.5, 6.5, 6.5]);
//! state.rescale_into(bigger);
//! ```

pub mod box_dim;
pub mod particles;
pub mod state;
