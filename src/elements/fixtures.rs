//! Recorded ISS element set used as a fixed test input. Epoch 2024-01-01T12:00:00Z.

use chrono::{DateTime, TimeZone, Utc};

use crate::elements::OrbitalElementSet;

pub const ISS_LINE1: &str =
    "1 25544U 98067A   24001.50000000  .00016717  00000-0  30375-3 0  9995";
pub const ISS_LINE2: &str =
    "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.49970689 44308";
pub const ISS_TLE: &str = "ISS (ZARYA)
1 25544U 98067A   24001.50000000  .00016717  00000-0  30375-3 0  9995
2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.49970689 44308
";

pub fn iss() -> OrbitalElementSet {
    OrbitalElementSet::parse(ISS_TLE).unwrap()
}

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}
