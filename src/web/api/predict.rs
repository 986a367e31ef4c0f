use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::elements::Freshness;
use crate::predict::{CompassPoint, ObserverSite, PassEvent};
use crate::service::PassQuery;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::api::{parse_instant, round2, round_azimuth};
use crate::web::state::AppState;

const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PassesQuery {
    /// Observer latitude in degrees; the home station is used when absent.
    pub lat: Option<f64>,
    /// Observer longitude in degrees.
    pub lon: Option<f64>,
    /// Observer altitude in meters.
    pub alt: Option<f64>,
    pub label: Option<String>,
    /// Window start (RFC 3339), defaults to now.
    pub start: Option<String>,
    /// Window end (RFC 3339), defaults to start plus the configured window.
    pub end: Option<String>,
    pub min_elevation: Option<f64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PassResponse {
    pub rise: DateTime<Utc>,
    pub peak: DateTime<Utc>,
    pub set: DateTime<Utc>,
    /// Local calendar date of the rise, e.g. `2024-01-01`.
    pub date: String,
    pub rise_local: String,
    pub peak_local: String,
    pub set_local: String,
    pub duration_seconds: f64,
    pub peak_elevation_deg: f64,
    pub rise_azimuth_deg: f64,
    pub peak_azimuth_deg: f64,
    pub set_azimuth_deg: f64,
    pub rise_direction: CompassPoint,
    pub set_direction: CompassPoint,
    /// e.g. `from NW to SE`
    pub direction: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PassesResponse {
    pub observer: ObserverSite,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub min_elevation_deg: f64,
    pub timezone: String,
    pub passes: Vec<PassResponse>,
    pub freshness: Freshness,
}

fn pass_response(pass: &PassEvent, tz: Tz) -> PassResponse {
    let local = |t: DateTime<Utc>| t.with_timezone(&tz).format("%H:%M:%S").to_string();
    PassResponse {
        rise: pass.rise,
        peak: pass.peak,
        set: pass.set,
        date: pass.rise.with_timezone(&tz).format("%Y-%m-%d").to_string(),
        rise_local: local(pass.rise),
        peak_local: local(pass.peak),
        set_local: local(pass.set),
        duration_seconds: pass.duration_seconds.round(),
        peak_elevation_deg: round2(pass.peak_elevation_deg),
        rise_azimuth_deg: round_azimuth(pass.rise_azimuth_deg),
        peak_azimuth_deg: round_azimuth(pass.peak_azimuth_deg),
        set_azimuth_deg: round_azimuth(pass.set_azimuth_deg),
        rise_direction: pass.rise_direction,
        set_direction: pass.set_direction,
        direction: format!("from {} to {}", pass.rise_direction, pass.set_direction),
    }
}

fn observer_for(query: &PassesQuery, home: &ObserverSite) -> ApiResult<ObserverSite> {
    match (query.lat, query.lon) {
        (None, None) => Ok(home.clone()),
        (Some(lat), Some(lon)) => {
            let label = query.label.clone().unwrap_or_else(|| format!("{:.4},{:.4}", lat, lon));
            Ok(ObserverSite::new(label, lat, lon, query.alt.unwrap_or(0.0))?)
        }
        _ => Err(ApiError::Validation(
            "lat and lon must be given together".into(),
        )),
    }
}

#[utoipa::path(
    get,
    path = "/api/passes",
    tag = "passes",
    params(PassesQuery),
    responses(
        (status = 200, description = "Upcoming visible passes in time order", body = PassesResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 422, description = "Window outside the element freshness horizon", body = ErrorResponse),
        (status = 503, description = "No elements loaded yet", body = ErrorResponse),
        (status = 504, description = "Search did not finish in time", body = ErrorResponse)
    )
)]
pub async fn list_passes(
    State(state): State<AppState>,
    Query(query): Query<PassesQuery>,
) -> ApiResult<Json<PassesResponse>> {
    let observer = observer_for(&query, &state.home)?;
    let start = parse_instant("start", query.start.as_deref(), Utc::now())?;
    let end = parse_instant("end", query.end.as_deref(), start + state.window)?;
    let min_elevation_deg = query
        .min_elevation
        .unwrap_or(state.config.predict.default_min_elevation);
    let limit = query
        .limit
        .unwrap_or(state.config.predict.max_passes)
        .clamp(1, MAX_LIMIT);

    let answer = state
        .service
        .search_passes(PassQuery {
            observer: observer.clone(),
            start,
            end,
            min_elevation_deg,
        })
        .await?;

    let tz = state.config.display.timezone;
    Ok(Json(PassesResponse {
        observer,
        start,
        end,
        min_elevation_deg,
        timezone: tz.name().to_string(),
        passes: answer
            .value
            .iter()
            .take(limit)
            .map(|p| pass_response(p, tz))
            .collect(),
        freshness: answer.freshness,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sample_pass() -> PassEvent {
        let rise = Utc.with_ymd_and_hms(2024, 1, 1, 23, 58, 30).unwrap();
        PassEvent {
            rise,
            peak: rise + Duration::seconds(150),
            set: rise + Duration::seconds(301),
            peak_elevation_deg: 47.123,
            rise_azimuth_deg: 311.0,
            peak_azimuth_deg: 220.004,
            set_azimuth_deg: 135.2,
            rise_direction: CompassPoint::from_azimuth(311.0),
            set_direction: CompassPoint::from_azimuth(135.2),
            duration_seconds: 301.0,
        }
    }

    #[test]
    fn pass_is_decorated_in_local_time() {
        let dto = pass_response(&sample_pass(), chrono_tz::Europe::Warsaw);
        assert_eq!(dto.date, "2024-01-02");
        assert_eq!(dto.rise_local, "00:58:30");
        assert_eq!(dto.set_local, "01:03:31");
        assert_eq!(dto.direction, "from NW to SE");
        assert_eq!(dto.peak_elevation_deg, 47.12);
        assert_eq!(dto.peak_azimuth_deg, 220.0);

        let utc = pass_response(&sample_pass(), Tz::UTC);
        assert_eq!(utc.date, "2024-01-01");
        assert_eq!(utc.rise_local, "23:58:30");
    }

    fn query(lat: Option<f64>, lon: Option<f64>) -> PassesQuery {
        PassesQuery {
            lat,
            lon,
            alt: None,
            label: None,
            start: None,
            end: None,
            min_elevation: None,
            limit: None,
        }
    }

    #[test]
    fn observer_defaults_to_home() {
        let home = ObserverSite::new("home", 52.23, 21.01, 100.0).unwrap();
        assert_eq!(observer_for(&query(None, None), &home).unwrap(), home);

        let site = observer_for(&query(Some(40.7), Some(-74.0)), &home).unwrap();
        assert_eq!(site.label, "40.7000,-74.0000");
        assert_eq!(site.position.altitude_m, 0.0);

        assert!(matches!(
            observer_for(&query(Some(40.7), None), &home),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            observer_for(&query(Some(95.0), Some(0.0)), &home),
            Err(ApiError::Predict(_))
        ));
    }
}
