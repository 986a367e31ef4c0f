use chrono::{DateTime, Duration, Utc};
use sgp4::MinutesSinceEpoch;

use crate::elements::OrbitalElementSet;
use crate::predict::error::PredictError;
use crate::predict::types::{GeodeticPosition, LookAngles, ObserverSite, PropagationResult};

// WGS-84
pub const WGS84_A_KM: f64 = 6378.137;
pub const WGS84_F: f64 = 1.0 / 298.257223563;
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

pub const DEFAULT_FRESHNESS_HORIZON: Duration = Duration::days(3);

/// SGP4 propagation guarded by a freshness horizon around the element epoch.
/// Pure: results depend only on the element set and the requested instant.
#[derive(Debug, Clone, Copy)]
pub struct Propagator {
    horizon: Duration,
}

/// Raw SGP4 output rotated into the Earth-fixed frame.
#[derive(Debug, Clone, Copy)]
struct State {
    teme_km: [f64; 3],
    velocity_km_s: [f64; 3],
    ecef_km: [f64; 3],
}

impl Default for Propagator {
    fn default() -> Self {
        Self::new(DEFAULT_FRESHNESS_HORIZON)
    }
}

impl Propagator {
    pub fn new(horizon: Duration) -> Self {
        Self { horizon }
    }

    /// Last instant this propagator accepts for `elements`.
    pub fn valid_until(&self, elements: &OrbitalElementSet) -> DateTime<Utc> {
        elements.epoch() + self.horizon
    }

    pub fn check_horizon(
        &self,
        elements: &OrbitalElementSet,
        instant: DateTime<Utc>,
    ) -> Result<(), PredictError> {
        let offset = instant - elements.epoch();
        if offset > self.horizon || offset < -self.horizon {
            return Err(PredictError::StaleElements {
                epoch: elements.epoch(),
                instant,
            });
        }
        Ok(())
    }

    pub fn propagate(
        &self,
        elements: &OrbitalElementSet,
        instant: DateTime<Utc>,
    ) -> Result<PropagationResult, PredictError> {
        let state = self.state(elements, instant)?;
        let v = state.velocity_km_s;

        Ok(PropagationResult {
            instant,
            position: ecef_to_geodetic(state.ecef_km),
            position_ecef_km: state.ecef_km,
            position_teme_km: state.teme_km,
            velocity_km_s: v,
            speed_km_s: (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt(),
        })
    }

    pub fn look_angles(
        &self,
        elements: &OrbitalElementSet,
        observer: &ObserverSite,
        instant: DateTime<Utc>,
    ) -> Result<LookAngles, PredictError> {
        let state = self.state(elements, instant)?;
        Ok(observer.look_angles(state.ecef_km))
    }

    fn state(
        &self,
        elements: &OrbitalElementSet,
        instant: DateTime<Utc>,
    ) -> Result<State, PredictError> {
        self.check_horizon(elements, instant)?;

        let minutes = (instant - elements.epoch()).num_milliseconds() as f64 / 60_000.0;
        let prediction = elements.constants().propagate(MinutesSinceEpoch(minutes))?;
        let gmst = sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(
            &instant.naive_utc(),
        ));

        Ok(State {
            teme_km: prediction.position,
            velocity_km_s: prediction.velocity,
            ecef_km: teme_to_ecef_position(prediction.position, gmst),
        })
    }
}

pub fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

pub fn geodetic_to_ecef_km(position: &GeodeticPosition) -> [f64; 3] {
    let lat = position.latitude_deg.to_radians();
    let lon = position.longitude_deg.to_radians();
    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let n = WGS84_A_KM / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    let alt_km = position.altitude_m / 1000.0;
    [
        (n + alt_km) * cos_lat * lon.cos(),
        (n + alt_km) * cos_lat * lon.sin(),
        (n * (1.0 - WGS84_E2) + alt_km) * sin_lat,
    ]
}

/// Iterative ECEF to WGS-84 geodetic conversion. Longitude lands in `[-180, 180)`.
pub fn ecef_to_geodetic(ecef_km: [f64; 3]) -> GeodeticPosition {
    let [x, y, z] = ecef_km;
    let p = (x * x + y * y).sqrt();
    let lon = y.atan2(x);

    let mut lat = z.atan2(p * (1.0 - WGS84_E2));
    for _ in 0..6 {
        let sin_lat = lat.sin();
        let n = WGS84_A_KM / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        lat = (z + WGS84_E2 * n * sin_lat).atan2(p);
    }

    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let n = WGS84_A_KM / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    // Valid at the poles as well, unlike p / cos(lat) - n.
    let alt_km = p * cos_lat + (z + WGS84_E2 * n * sin_lat) * sin_lat - n;

    GeodeticPosition {
        latitude_deg: lat.to_degrees(),
        longitude_deg: normalize_longitude(lon.to_degrees()),
        altitude_m: alt_km * 1000.0,
    }
}

pub fn normalize_longitude(lon_deg: f64) -> f64 {
    let lon = (lon_deg + 180.0).rem_euclid(360.0) - 180.0;
    if lon >= 180.0 {
        -180.0
    } else {
        lon
    }
}

pub fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    let sin_lon = lon_rad.sin();
    let cos_lon = lon_rad.cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}
