use utoipa::OpenApi;

use super::api::error::ErrorResponse;
use super::api::position::{MetricsResponse, PositionResponse, StatusResponse};
use super::api::predict::{PassResponse, PassesResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::position::status,
        super::api::position::position,
        super::api::position::metrics,
        super::api::predict::list_passes,
    ),
    components(
        schemas(
            StatusResponse,
            PositionResponse,
            MetricsResponse,
            PassesResponse,
            PassResponse,
            ErrorResponse,
            crate::elements::Freshness,
            crate::predict::ObserverSite,
            crate::predict::GeodeticPosition,
            crate::predict::CompassPoint,
        )
    ),
    info(
        title = "ISS Tracker API",
        description = "Current position, speed and visible passes of the International Space Station",
        version = "0.1.0"
    ),
    tags(
        (name = "station", description = "Position and orbit metrics"),
        (name = "passes", description = "Visible pass prediction")
    )
)]
pub struct ApiDoc;
