//! # Core Module
//!
//! The stateless foundation of the box Monte Carlo library: data models for the
//! periodic cell and its particles, the overlap interface the updater consults,
//! pressure schedules, and file I/O.
//!
//! ## Architecture
//!
//! - **System Representation** ([`models`]) - Triclinic box, particle positions and image
//!   flags, and the combined simulation state
//! - **Interactions** ([`overlap`]) - The `OverlapOracle` trait, the `EnergyChange` result
//!   type, and a reference hard-sphere oracle
//! - **Thermodynamic Parameters** ([`pressure`]) - Time-dependent reduced pressure `β·P`
//! - **File I/O** ([`io`]) - CSV box logs and TOML state snapshots
//!
//! Nothing in this module holds random state or counters; everything that
//! changes from step to step lives in [`crate::engine`].

pub mod io;
pub mod models;
pub mod overlap;
pub mod pressure;
