//! # Workflows Module
//!
//! High-level procedures built on the [`engine`](crate::engine) updater.
//! Workflows own the step loop, progress reporting, and result collection,
//! so callers only supply a state, an oracle and a pressure.
//!
//! - **NPT Workflow** ([`npt`]) - advances a state through a fixed number of
//!   timesteps with box Monte Carlo updates at a configurable period.

pub mod npt;
