use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sgp4::{Constants, Elements};

use crate::elements::error::ElementsError;

/// NORAD catalog number of the International Space Station.
pub const ISS_NORAD_ID: u64 = 25544;

/// A parsed two-line element set together with the SGP4 constants derived
/// from it. Immutable once built; a refresh replaces the whole value.
pub struct OrbitalElementSet {
    elements: Elements,
    constants: Constants,
}

/// JSON shape served by the public ISS TLE endpoint.
#[derive(Debug, Deserialize)]
struct TlePayload {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    header: Option<String>,
    line1: String,
    line2: String,
}

impl OrbitalElementSet {
    pub fn from_lines(
        name: Option<String>,
        line1: &str,
        line2: &str,
    ) -> Result<Self, ElementsError> {
        let line1 = line1.trim();
        let line2 = line2.trim();
        let elements = Elements::from_tle(name, line1.as_bytes(), line2.as_bytes())?;
        if elements.mean_motion.is_nan() || elements.mean_motion <= 0.0 {
            return Err(ElementsError::MeanMotion(elements.mean_motion));
        }
        let constants = Constants::from_elements(&elements)?;

        Ok(Self {
            elements,
            constants,
        })
    }

    /// Parse a single 2-line or 3-line (named) record.
    pub fn parse(text: &str) -> Result<Self, ElementsError> {
        let lines: Vec<&str> = text
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect();

        match lines.len() {
            2 => Self::from_lines(None, lines[0], lines[1]),
            3 => Self::from_lines(Some(object_name(lines[0])), lines[1], lines[2]),
            n => Err(ElementsError::Format(n)),
        }
    }

    pub fn from_json(body: &str) -> Result<Self, ElementsError> {
        let payload: TlePayload = serde_json::from_str(body)?;
        let name = payload.header.or(payload.name);
        Self::from_lines(name, &payload.line1, &payload.line2)
    }

    /// Pick the record for `norad_id` out of a multi-satellite TLE document.
    pub fn find_in(content: &str, norad_id: u64) -> Result<Self, ElementsError> {
        let mut last_error = None;
        for (name, line1, line2) in split_records(content) {
            match Self::from_lines(name, line1, line2) {
                Ok(set) if set.norad_id() == norad_id => return Ok(set),
                Ok(_) => {}
                Err(e) => {
                    log::debug!("Skipping unparseable TLE record: {}", e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or(ElementsError::NotFound(norad_id)))
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        self.elements.datetime.and_utc()
    }

    pub fn name(&self) -> Option<&str> {
        self.elements.object_name.as_deref()
    }

    pub fn norad_id(&self) -> u64 {
        self.elements.norad_id
    }

    /// Revolutions per day.
    pub fn mean_motion(&self) -> f64 {
        self.elements.mean_motion
    }

    pub fn inclination_deg(&self) -> f64 {
        self.elements.inclination
    }

    pub fn eccentricity(&self) -> f64 {
        self.elements.eccentricity
    }

    pub fn constants(&self) -> &Constants {
        &self.constants
    }
}

impl fmt::Debug for OrbitalElementSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrbitalElementSet")
            .field("name", &self.name())
            .field("norad_id", &self.norad_id())
            .field("epoch", &self.epoch())
            .field("mean_motion", &self.mean_motion())
            .finish()
    }
}

/// Celestrak 3LE files prefix names with "0 ".
fn object_name(line: &str) -> String {
    line.strip_prefix("0 ").unwrap_or(line).trim().to_string()
}

/// Split TLE content that may hold several satellites, with or without name lines.
fn split_records(content: &str) -> Vec<(Option<String>, &str, &str)> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut result = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].starts_with("1 ") && i + 1 < lines.len() && lines[i + 1].starts_with("2 ") {
            result.push((None, lines[i], lines[i + 1]));
            i += 2;
        } else if i + 2 < lines.len()
            && lines[i + 1].starts_with("1 ")
            && lines[i + 2].starts_with("2 ")
        {
            result.push((Some(object_name(lines[i])), lines[i + 1], lines[i + 2]));
            i += 3;
        } else {
            i += 1;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::fixtures::{ISS_LINE1, ISS_LINE2, ISS_TLE};
    use chrono::TimeZone;

    #[test]
    fn parses_named_record() {
        let set = OrbitalElementSet::parse(ISS_TLE).unwrap();
        assert_eq!(set.name(), Some("ISS (ZARYA)"));
        assert_eq!(set.norad_id(), ISS_NORAD_ID);
        assert_eq!(set.epoch(), Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
        assert!((set.mean_motion() - 15.49970689).abs() < 1e-9);
        assert!((set.inclination_deg() - 51.6416).abs() < 1e-9);
    }

    #[test]
    fn parses_unnamed_record() {
        let text = format!("{}\n{}\n", ISS_LINE1, ISS_LINE2);
        let set = OrbitalElementSet::parse(&text).unwrap();
        assert_eq!(set.name(), None);
        assert_eq!(set.norad_id(), ISS_NORAD_ID);
        assert_eq!(set.epoch(), Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn rejects_wrong_line_count() {
        let err = OrbitalElementSet::parse(ISS_LINE1).unwrap_err();
        assert!(matches!(err, ElementsError::Format(1)));
    }

    #[test]
    fn rejects_bad_checksum() {
        let broken = ISS_LINE1.replace("9995", "9990");
        assert!(OrbitalElementSet::from_lines(None, &broken, ISS_LINE2).is_err());
    }

    #[test]
    fn parses_json_payload() {
        let body = serde_json::json!({
            "name": "iss",
            "id": "25544",
            "header": "ISS (ZARYA)",
            "line1": ISS_LINE1,
            "line2": ISS_LINE2,
        })
        .to_string();
        let set = OrbitalElementSet::from_json(&body).unwrap();
        assert_eq!(set.name(), Some("ISS (ZARYA)"));
    }

    #[test]
    fn finds_record_in_catalog() {
        let catalog = format!(
            "0 SOME DEBRIS\n{}\n{}\n{}\n",
            ISS_LINE1.replace("25544", "25545"),
            ISS_LINE2.replace("25544", "25545"),
            ISS_TLE
        );
        let set = OrbitalElementSet::find_in(&catalog, ISS_NORAD_ID).unwrap();
        assert_eq!(set.norad_id(), ISS_NORAD_ID);
    }

    #[test]
    fn missing_record_is_not_found() {
        let err = OrbitalElementSet::find_in("", ISS_NORAD_ID).unwrap_err();
        assert!(matches!(err, ElementsError::NotFound(ISS_NORAD_ID)));
    }
}
