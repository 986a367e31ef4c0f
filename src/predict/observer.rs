use crate::predict::error::PredictError;
use crate::predict::propagation::{ecef_to_enu, geodetic_to_ecef_km};
use crate::predict::types::{GeodeticPosition, LookAngles, ObserverSite};

impl GeodeticPosition {
    pub fn new(latitude_deg: f64, longitude_deg: f64, altitude_m: f64) -> Result<Self, PredictError> {
        if !(-90.0..=90.0).contains(&latitude_deg) {
            return Err(PredictError::InvalidObserver(format!(
                "latitude {} outside [-90, 90]",
                latitude_deg
            )));
        }
        if !(-180.0..=180.0).contains(&longitude_deg) {
            return Err(PredictError::InvalidObserver(format!(
                "longitude {} outside [-180, 180]",
                longitude_deg
            )));
        }
        if !altitude_m.is_finite() {
            return Err(PredictError::InvalidObserver(format!(
                "altitude {} is not finite",
                altitude_m
            )));
        }
        Ok(Self {
            latitude_deg,
            longitude_deg,
            altitude_m,
        })
    }
}

impl ObserverSite {
    pub fn new(
        label: impl Into<String>,
        latitude_deg: f64,
        longitude_deg: f64,
        altitude_m: f64,
    ) -> Result<Self, PredictError> {
        Ok(Self {
            label: label.into(),
            position: GeodeticPosition::new(latitude_deg, longitude_deg, altitude_m)?,
        })
    }

    /// Parse `"lat,lon"` as written in the config file.
    pub fn from_coordinates(
        label: impl Into<String>,
        coordinates: &str,
        altitude_m: f64,
    ) -> Result<Self, PredictError> {
        let invalid = || PredictError::InvalidObserver(format!("bad coordinates '{}'", coordinates));
        let parts: Vec<_> = coordinates.split(',').map(|s| s.trim()).collect();
        if parts.len() != 2 {
            return Err(invalid());
        }
        let lat = parts[0].parse().map_err(|_| invalid())?;
        let lon = parts[1].parse().map_err(|_| invalid())?;
        Self::new(label, lat, lon, altitude_m)
    }

    pub fn position_ecef_km(&self) -> [f64; 3] {
        geodetic_to_ecef_km(&self.position)
    }

    /// Azimuth/elevation/range of an Earth-fixed target as seen from this site.
    pub fn look_angles(&self, target_ecef_km: [f64; 3]) -> LookAngles {
        let site = self.position_ecef_km();
        let dr = [
            target_ecef_km[0] - site[0],
            target_ecef_km[1] - site[1],
            target_ecef_km[2] - site[2],
        ];
        let range_km = (dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2]).sqrt();

        let (east, north, up) = ecef_to_enu(
            dr,
            self.position.latitude_deg.to_radians(),
            self.position.longitude_deg.to_radians(),
        );
        let azimuth_deg = east.atan2(north).to_degrees().rem_euclid(360.0);
        let elevation_deg = if range_km > 0.0 {
            (up / range_km).clamp(-1.0, 1.0).asin().to_degrees()
        } else {
            90.0
        };

        LookAngles {
            azimuth_deg: if azimuth_deg >= 360.0 { 0.0 } else { azimuth_deg },
            elevation_deg,
            range_km,
        }
    }
}
