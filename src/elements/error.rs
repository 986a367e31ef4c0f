use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ElementsError {
    #[error("invalid tle format: expected 2 or 3 lines, got {0}")]
    Format(usize),
    #[error("invalid tle: {0}")]
    Tle(#[from] sgp4::TleError),
    #[error("elements error: {0}")]
    Constants(#[from] sgp4::ElementsError),
    #[error("invalid tle payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid mean motion {0} rev/day")]
    MeanMotion(f64),
    #[error("no element set for NORAD {0}")]
    NotFound(u64),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("element source returned HTTP {0}")]
    Status(u16),
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed element set: {0}")]
    Malformed(#[from] ElementsError),
}
