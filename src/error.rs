//! Error types for SnakePilot

use thiserror::Error;

/// SnakePilot error type
#[derive(Error, Debug)]
pub enum PilotError {
    #[error("Connection failed: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No GPS fix after {attempts} attempts")]
    NoGpsFix { attempts: u32 },

    #[error("No position fix after {attempts} attempts")]
    NoPositionFix { attempts: u32 },
}

impl From<toml::de::Error> for PilotError {
    fn from(e: toml::de::Error) -> Self {
        PilotError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for PilotError {
    fn from(e: serde_json::Error) -> Self {
        PilotError::Protocol(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PilotError>;
