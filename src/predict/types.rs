use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use utoipa::ToSchema;

/// Latitude/longitude in degrees, altitude in meters above the WGS-84 ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeodeticPosition {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ObserverSite {
    pub label: String,
    pub position: GeodeticPosition,
}

/// Station state at one instant. Recomputed per query.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PropagationResult {
    pub instant: DateTime<Utc>,
    /// Sub-satellite point and altitude.
    pub position: GeodeticPosition,
    /// Earth-fixed position, km.
    #[schema(value_type = Vec<f64>)]
    pub position_ecef_km: [f64; 3],
    /// TEME (inertial) position, km.
    #[schema(value_type = Vec<f64>)]
    pub position_teme_km: [f64; 3],
    /// TEME velocity, km/s.
    #[schema(value_type = Vec<f64>)]
    pub velocity_km_s: [f64; 3],
    pub speed_km_s: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct LookAngles {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, ToSchema)]
pub enum CompassPoint {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl CompassPoint {
    const ALL: [CompassPoint; 8] = [
        CompassPoint::N,
        CompassPoint::NE,
        CompassPoint::E,
        CompassPoint::SE,
        CompassPoint::S,
        CompassPoint::SW,
        CompassPoint::W,
        CompassPoint::NW,
    ];

    pub fn from_azimuth(azimuth_deg: f64) -> Self {
        let idx = (azimuth_deg.rem_euclid(360.0) / 45.0 + 0.5) as usize % 8;
        Self::ALL[idx]
    }
}

/// One interval during which the station is above the elevation threshold.
/// `rise < peak < set`, azimuths in `[0, 360)`.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PassEvent {
    pub rise: DateTime<Utc>,
    pub peak: DateTime<Utc>,
    pub set: DateTime<Utc>,
    pub peak_elevation_deg: f64,
    pub rise_azimuth_deg: f64,
    pub peak_azimuth_deg: f64,
    pub set_azimuth_deg: f64,
    pub rise_direction: CompassPoint,
    pub set_direction: CompassPoint,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct OrbitMetrics {
    /// Inertial speed from two propagated positions.
    pub speed_km_s: f64,
    /// Speed of the sub-satellite point over the ground.
    pub ground_speed_km_s: f64,
    pub period_minutes: f64,
}
