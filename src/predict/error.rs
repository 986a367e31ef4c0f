use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("instant {instant} is outside the freshness horizon of elements with epoch {epoch}")]
    StaleElements {
        epoch: DateTime<Utc>,
        instant: DateTime<Utc>,
    },
    #[error("invalid window: end {end} is not after start {start}")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("invalid minimum elevation {0}: must be within [0, 90)")]
    InvalidElevation(f64),
    #[error("invalid sampling delta {0} s: must be within (0, 600]")]
    InvalidDelta(f64),
    #[error("invalid observer: {0}")]
    InvalidObserver(String),
    #[error("propagation error: {0}")]
    Propagation(String),
    #[error("pass search cancelled")]
    Cancelled,
    #[error("no orbital elements loaded yet")]
    ElementsUnavailable,
    #[error("pass search task failed: {0}")]
    Task(String),
}

impl From<sgp4::Error> for PredictError {
    fn from(err: sgp4::Error) -> Self {
        PredictError::Propagation(err.to_string())
    }
}
