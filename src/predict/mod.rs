mod error;
mod metrics;
mod observer;
mod pass_finder;
mod propagation;
mod search;
mod types;

pub use error::PredictError;
pub use metrics::{estimate_period, orbit_metrics, DEFAULT_DELTA, MAX_DELTA_SECONDS};
pub use pass_finder::{find_passes, SearchOptions, DEFAULT_MIN_ELEVATION_DEG};
pub use propagation::{Propagator, DEFAULT_FRESHNESS_HORIZON};
pub use types::{
    CompassPoint, GeodeticPosition, ObserverSite, OrbitMetrics, PassEvent, PropagationResult,
};
