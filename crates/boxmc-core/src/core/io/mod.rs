//! Reading and writing simulation data.
//!
//! [`box_log`] streams one CSV row per box update so acceptance and box
//! fluctuations can be analysed after a run. [`snapshot`] saves and restores a
//! complete [`SimulationState`](crate::core::models::state::SimulationState)
//! as TOML, which the command-line front end uses for initial and final
//! configurations.

pub mod box_log;
pub mod snapshot;
