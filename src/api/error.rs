//! Request failures and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::api::types::ErrorResponse;
use crate::domain::FeatureError;

/// Every way `/predict` can fail. The display text is the public message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Modelo no disponible")]
    ModelUnavailable,

    #[error("Content-Type debe ser application/json")]
    UnsupportedContentType,

    #[error("Body vacío")]
    EmptyBody,

    #[error("Campo \"features\" requerido")]
    MissingFeatures,

    #[error("Features debe ser lista")]
    FeaturesNotAList,

    #[error("Se requieren 4 features")]
    WrongFeatureCount,

    #[error("Todas las features deben ser numéricas")]
    NonNumericFeatures,

    #[error("Error interno en predicción")]
    PredictionFailed,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ModelUnavailable | Self::PredictionFailed => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UnsupportedContentType
            | Self::EmptyBody
            | Self::MissingFeatures
            | Self::FeaturesNotAList
            | Self::WrongFeatureCount
            | Self::NonNumericFeatures => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<FeatureError> for ApiError {
    fn from(err: FeatureError) -> Self {
        match err {
            FeatureError::NotAList => Self::FeaturesNotAList,
            FeatureError::WrongLength { .. } => Self::WrongFeatureCount,
            FeatureError::NonNumeric { .. } => Self::NonNumericFeatures,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
