//! Error types for the loss-system experiments

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring, running or reporting an experiment
///
/// Rejected requests are a modelled outcome and never show up here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Sweep point {index} failed: {message}")]
    PointFailed { index: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Plot error: {0}")]
    Plot(String),
}

impl From<des::parallel::ScenarioPanic> for Error {
    fn from(panic: des::parallel::ScenarioPanic) -> Self {
        Error::PointFailed {
            index: panic.scenario_id,
            message: panic.message,
        }
    }
}
