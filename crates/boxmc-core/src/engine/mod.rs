//! # Engine Module
//!
//! The stateful box Monte Carlo updater and everything it needs to run a
//! single trial: move selection, candidate construction, geometric screening,
//! ensemble acceptance, exact rollback, and acceptance statistics.
//!
//! ## Control Flow
//!
//! Every call to [`updater::BoxMcUpdater::step`] follows the same path:
//!
//! - **Selection** ([`selector`]) - one weighted draw picks the volume, length or shear move
//! - **Transformation** ([`transform`]) - the candidate box is built from the current one
//! - **Screening** ([`validity`]) - boxes too small for the interaction cutoff are refused
//! - **Trial** ([`transaction`]) - positions are rescaled, the oracle is asked, and the
//!   Metropolis rule from [`acceptance`] decides; any rejection restores the backup
//! - **Bookkeeping** ([`counters`]) - the outcome is tallied per category
//!
//! Random numbers for a step come from a stream keyed by `(seed, timestep)`
//! ([`rng`]), so identical inputs give identical decisions on every process.

pub mod acceptance;
pub mod backup;
pub mod config;
pub mod counters;
pub mod error;
pub mod progress;
pub mod rng;
pub mod selector;
pub mod transaction;
pub mod transform;
pub mod updater;
pub mod validity;
