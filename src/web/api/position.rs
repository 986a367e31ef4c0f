use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::elements::Freshness;
use crate::predict::{ObserverSite, OrbitMetrics, PropagationResult};
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::api::{parse_instant, round2};
use crate::web::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InstantQuery {
    /// Instant to evaluate (RFC 3339), defaults to now.
    pub at: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PositionResponse {
    pub instant: DateTime<Utc>,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
    pub speed_km_s: f64,
    pub freshness: Freshness,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MetricsResponse {
    pub instant: DateTime<Utc>,
    pub speed_km_s: f64,
    pub speed_km_h: f64,
    pub ground_speed_km_s: f64,
    pub period_minutes: f64,
    pub freshness: Freshness,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub name: Option<String>,
    pub norad_id: u64,
    pub position: PositionResponse,
    pub speed_km_h: f64,
    pub period_minutes: f64,
    pub home: ObserverSite,
}

fn position_response(result: &PropagationResult, freshness: Freshness) -> PositionResponse {
    PositionResponse {
        instant: result.instant,
        latitude_deg: round2(result.position.latitude_deg),
        longitude_deg: round2(result.position.longitude_deg),
        altitude_km: round2(result.position.altitude_m / 1000.0),
        speed_km_s: round2(result.speed_km_s),
        freshness,
    }
}

fn metrics_response(
    instant: DateTime<Utc>,
    metrics: &OrbitMetrics,
    freshness: Freshness,
) -> MetricsResponse {
    MetricsResponse {
        instant,
        speed_km_s: round2(metrics.speed_km_s),
        speed_km_h: (metrics.speed_km_s * 3600.0).round(),
        ground_speed_km_s: round2(metrics.ground_speed_km_s),
        period_minutes: round2(metrics.period_minutes),
        freshness,
    }
}

#[utoipa::path(
    get,
    path = "/api/position",
    tag = "station",
    params(InstantQuery),
    responses(
        (status = 200, description = "Sub-satellite point and altitude", body = PositionResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 422, description = "Instant outside the element freshness horizon", body = ErrorResponse),
        (status = 503, description = "No elements loaded yet", body = ErrorResponse)
    )
)]
pub async fn position(
    State(state): State<AppState>,
    Query(query): Query<InstantQuery>,
) -> ApiResult<Json<PositionResponse>> {
    let now = Utc::now();
    let at = parse_instant("at", query.at.as_deref(), now)?;
    let answer = state.service.current_position(at, now)?;
    Ok(Json(position_response(&answer.value, answer.freshness)))
}

#[utoipa::path(
    get,
    path = "/api/metrics",
    tag = "station",
    params(InstantQuery),
    responses(
        (status = 200, description = "Speed and orbital period", body = MetricsResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 422, description = "Instant outside the element freshness horizon", body = ErrorResponse),
        (status = 503, description = "No elements loaded yet", body = ErrorResponse)
    )
)]
pub async fn metrics(
    State(state): State<AppState>,
    Query(query): Query<InstantQuery>,
) -> ApiResult<Json<MetricsResponse>> {
    let now = Utc::now();
    let at = parse_instant("at", query.at.as_deref(), now)?;
    let answer = state.service.velocity_and_period(at, now)?;
    Ok(Json(metrics_response(at, &answer.value, answer.freshness)))
}

#[utoipa::path(
    get,
    path = "/api/status",
    tag = "station",
    responses(
        (status = 200, description = "Current position, speed and period", body = StatusResponse),
        (status = 422, description = "Loaded elements are too old to propagate to now", body = ErrorResponse),
        (status = 503, description = "No elements loaded yet", body = ErrorResponse)
    )
)]
pub async fn status(State(state): State<AppState>) -> ApiResult<Json<StatusResponse>> {
    let now = Utc::now();
    let answer = state.service.status(now, now)?;
    let report = answer.value;

    Ok(Json(StatusResponse {
        name: report.name,
        norad_id: report.norad_id,
        position: position_response(&report.position, answer.freshness),
        speed_km_h: (report.metrics.speed_km_s * 3600.0).round(),
        period_minutes: round2(report.metrics.period_minutes),
        home: state.home.clone(),
    }))
}
