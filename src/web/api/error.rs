use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::predict::PredictError;

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    Predict(PredictError),
}

impl From<PredictError> for ApiError {
    fn from(e: PredictError) -> Self {
        ApiError::Predict(e)
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
            ApiError::Predict(e) => match e {
                PredictError::InvalidWindow { .. }
                | PredictError::InvalidElevation(_)
                | PredictError::InvalidDelta(_)
                | PredictError::InvalidObserver(_) => {
                    (StatusCode::BAD_REQUEST, "validation_failed")
                }
                PredictError::StaleElements { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "stale_elements")
                }
                PredictError::ElementsUnavailable => {
                    (StatusCode::SERVICE_UNAVAILABLE, "elements_unavailable")
                }
                PredictError::Cancelled => (StatusCode::GATEWAY_TIMEOUT, "search_timeout"),
                PredictError::Propagation(_) | PredictError::Task(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "prediction_failed")
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match &self {
            ApiError::Validation(msg) => msg.clone(),
            ApiError::Predict(e) => e.to_string(),
        };
        if status.is_server_error() {
            log::error!("{}: {}", code, message);
        }
        (status, Json(ErrorResponse::with_message(code, &message))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn with_message(error: &str, message: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: Some(message.to_string()),
        }
    }
}
