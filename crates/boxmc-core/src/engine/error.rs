use super::config::ConfigError;
use crate::core::io::box_log::BoxLogError;
use crate::core::models::state::StateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Invalid simulation state: {source}")]
    State {
        #[from]
        source: StateError,
    },

    #[error(
        "Position backup holds {capacity} particles but {required} are live; \
         the updater must be notified of capacity changes before stepping"
    )]
    BackupUndersized { capacity: usize, required: usize },

    #[error("Unknown log quantity: '{0}'")]
    UnknownLogQuantity(String),

    #[error("Failed to write output: {source}")]
    Output {
        #[from]
        source: BoxLogError,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
