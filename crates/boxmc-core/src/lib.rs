//! # boxmc Core Library
//!
//! Monte Carlo box updates for isothermal-isobaric (NPT) simulations of hard
//! and soft particles in a triclinic periodic cell.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`BoxDim`, `SimulationState`),
//!   the [`OverlapOracle`](core::overlap::OverlapOracle) seam through which interactions
//!   are evaluated, pressure schedules, and file I/O.
//!
//! - **[`engine`]: The Logic Core.** The stateful box updater: move selection, trial
//!   box construction, validity checks, acceptance, exact rollback, and the running
//!   acceptance statistics.
//!
//! - **[`workflows`]: The Public API.** Complete procedures built from the two layers
//!   below, such as running an NPT equilibration for a fixed number of timesteps.

pub mod core;
pub mod engine;
pub mod workflows;
