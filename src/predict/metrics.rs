use chrono::{DateTime, Duration, Utc};

use crate::elements::OrbitalElementSet;
use crate::predict::error::PredictError;
use crate::predict::propagation::Propagator;
use crate::predict::types::{GeodeticPosition, OrbitMetrics};

/// Mean Earth radius used for the great-circle ground distance.
pub const EARTH_MEAN_RADIUS_KM: f64 = 6371.0;

/// Upper bound on the differencing interval. Beyond this the chord between
/// the two positions no longer approximates the instantaneous speed.
pub const MAX_DELTA_SECONDS: f64 = 600.0;

/// Default differencing interval: long enough that millisecond rounding of
/// the instants and SGP4 float noise stay far below the metre level, short
/// enough that orbit curvature shortens the chord by well under 0.1%.
pub const DEFAULT_DELTA: Duration = Duration::seconds(30);

fn delta_seconds(delta: Duration) -> Result<f64, PredictError> {
    let seconds = delta.num_milliseconds() as f64 / 1000.0;
    if seconds <= 0.0 || seconds > MAX_DELTA_SECONDS {
        return Err(PredictError::InvalidDelta(seconds));
    }
    Ok(seconds)
}

/// Inertial speed in km/s from two propagated positions `delta` apart.
pub fn estimate_velocity(
    propagator: &Propagator,
    elements: &OrbitalElementSet,
    instant: DateTime<Utc>,
    delta: Duration,
) -> Result<f64, PredictError> {
    let seconds = delta_seconds(delta)?;
    let a = propagator.propagate(elements, instant)?.position_teme_km;
    let b = propagator.propagate(elements, instant + delta)?.position_teme_km;
    let d = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    Ok((d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt() / seconds)
}

/// Speed of the sub-satellite point over the ground in km/s.
pub fn estimate_ground_speed(
    propagator: &Propagator,
    elements: &OrbitalElementSet,
    instant: DateTime<Utc>,
    delta: Duration,
) -> Result<f64, PredictError> {
    let seconds = delta_seconds(delta)?;
    let a = propagator.propagate(elements, instant)?.position;
    let b = propagator.propagate(elements, instant + delta)?.position;
    Ok(great_circle_km(&a, &b) / seconds)
}

/// Orbital period from the mean motion.
pub fn estimate_period(elements: &OrbitalElementSet) -> Duration {
    let minutes = 1440.0 / elements.mean_motion();
    Duration::milliseconds((minutes * 60_000.0).round() as i64)
}

pub fn orbit_metrics(
    propagator: &Propagator,
    elements: &OrbitalElementSet,
    instant: DateTime<Utc>,
    delta: Duration,
) -> Result<OrbitMetrics, PredictError> {
    Ok(OrbitMetrics {
        speed_km_s: estimate_velocity(propagator, elements, instant, delta)?,
        ground_speed_km_s: estimate_ground_speed(propagator, elements, instant, delta)?,
        period_minutes: estimate_period(elements).num_milliseconds() as f64 / 60_000.0,
    })
}

/// Haversine distance between two sub-satellite points.
pub fn great_circle_km(a: &GeodeticPosition, b: &GeodeticPosition) -> f64 {
    let phi1 = a.latitude_deg.to_radians();
    let phi2 = b.latitude_deg.to_radians();
    let dphi = (b.latitude_deg - a.latitude_deg).to_radians();
    let dlambda = (b.longitude_deg - a.longitude_deg).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_MEAN_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::fixtures::{epoch, iss};

    #[test]
    fn period_of_station_orbit() {
        let period = estimate_period(&iss());
        assert!(period > Duration::minutes(88) && period < Duration::minutes(93));
        // 1440 / 15.49970689 rev/day
        assert!((period.num_milliseconds() as f64 / 60_000.0 - 92.9050).abs() < 1e-3);
    }

    #[test]
    fn station_speed_is_orbital() {
        let speed =
            estimate_velocity(&Propagator::default(), &iss(), epoch(), DEFAULT_DELTA).unwrap();
        assert!((7.5..7.8).contains(&speed), "speed {}", speed);
    }

    #[test]
    fn ground_speed_is_slower_than_orbital() {
        let propagator = Propagator::default();
        let t = epoch() + Duration::minutes(20);
        let ground = estimate_ground_speed(&propagator, &iss(), t, DEFAULT_DELTA).unwrap();
        let orbital = estimate_velocity(&propagator, &iss(), t, DEFAULT_DELTA).unwrap();
        assert!((6.0..8.0).contains(&ground), "ground {}", ground);
        assert!(ground < orbital);
    }

    #[test]
    fn chord_speed_matches_sgp4_velocity() {
        let propagator = Propagator::default();
        let t = epoch() + Duration::hours(3);
        let chord = estimate_velocity(&propagator, &iss(), t, DEFAULT_DELTA).unwrap();
        let midpoint = propagator
            .propagate(&iss(), t + Duration::seconds(15))
            .unwrap()
            .speed_km_s;
        assert!((chord - midpoint).abs() < 0.01);
    }

    #[test]
    fn rejects_bad_delta() {
        let propagator = Propagator::default();
        for delta in [Duration::zero(), Duration::seconds(-5), Duration::seconds(601)] {
            let err = estimate_velocity(&propagator, &iss(), epoch(), delta).unwrap_err();
            assert!(matches!(err, PredictError::InvalidDelta(_)));
        }
    }

    #[test]
    fn great_circle_quarter_meridian() {
        let equator = GeodeticPosition {
            latitude_deg: 0.0,
            longitude_deg: 0.0,
            altitude_m: 0.0,
        };
        let pole = GeodeticPosition {
            latitude_deg: 90.0,
            longitude_deg: 0.0,
            altitude_m: 0.0,
        };
        let d = great_circle_km(&equator, &pole);
        assert!((d - EARTH_MEAN_RADIUS_KM * std::f64::consts::FRAC_PI_2).abs() < 1e-6);
    }
}
