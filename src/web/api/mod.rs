pub mod error;
pub mod position;
pub mod predict;

use chrono::{DateTime, Utc};

use error::ApiError;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Azimuth rounded to 0.01 degree, kept inside `[0, 360)`.
fn round_azimuth(azimuth_deg: f64) -> f64 {
    let az = round2(azimuth_deg);
    if az >= 360.0 {
        az - 360.0
    } else {
        az
    }
}

/// Optional RFC 3339 query parameter, `default` when absent.
fn parse_instant(
    name: &str,
    value: Option<&str>,
    default: DateTime<Utc>,
) -> Result<DateTime<Utc>, ApiError> {
    match value {
        None => Ok(default),
        Some(s) => DateTime::parse_from_rfc3339(s.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| ApiError::Validation(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn azimuth_rounding_stays_in_range() {
        assert_eq!(round_azimuth(359.996), 0.0);
        assert_eq!(round_azimuth(12.345_6), 12.35);
    }

    #[test]
    fn instants_parse_with_offsets() {
        let default = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_instant("at", None, default).unwrap(), default);
        assert_eq!(
            parse_instant("at", Some("2024-01-01T02:00:00+02:00"), default).unwrap(),
            default
        );
        assert!(matches!(
            parse_instant("at", Some("yesterday"), default),
            Err(ApiError::Validation(_))
        ));
    }
}
