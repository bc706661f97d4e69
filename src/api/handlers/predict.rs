use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap},
    Json,
};
use serde_json::Value;
use tracing::{error, info};

use crate::api::{
    error::ApiError,
    state::AppState,
    types::{PredictRequest, PredictResponse},
};
use crate::domain::{FeatureVector, Prediction};
use crate::model::ModelHandle;

/// POST /predict
pub async fn predict_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PredictResponse>, ApiError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let prediction = run_prediction(&state.model, content_type, &body)?;
    Ok(Json(PredictResponse {
        prediction: prediction.index,
        class_name: prediction.class_name.to_string(),
    }))
}

/// The validation pipeline; stops at the first failing check.
pub fn run_prediction(
    model: &ModelHandle,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<Prediction, ApiError> {
    let classifier = model.classifier().ok_or(ApiError::ModelUnavailable)?;

    if !content_type.is_some_and(is_json_content_type) {
        return Err(ApiError::UnsupportedContentType);
    }

    // Unparsable JSON is treated the same as an empty body.
    let payload: Value = match serde_json::from_slice(body) {
        Ok(v) if !is_falsy(&v) => v,
        _ => return Err(ApiError::EmptyBody),
    };

    if !payload.is_object() {
        return Err(ApiError::MissingFeatures);
    }
    let request: PredictRequest =
        serde_json::from_value(payload).map_err(|_| ApiError::MissingFeatures)?;
    let raw = request.features.ok_or(ApiError::MissingFeatures)?;

    let features = FeatureVector::try_from(&raw)?;

    let index = classifier.predict(&features).map_err(|e| {
        error!(error = %e, features = %features, "prediction failed");
        ApiError::PredictionFailed
    })?;
    let prediction = Prediction::from_index(index).map_err(|e| {
        error!(error = %e, features = %features, "classifier returned unknown class");
        ApiError::PredictionFailed
    })?;

    info!(
        prediction = prediction.index,
        class_name = prediction.class_name,
        "prediction served"
    );
    Ok(prediction)
}

/// `application/json` or any `application/*+json`, parameters ignored.
fn is_json_content_type(value: &str) -> bool {
    let mime = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json"
        || (mime.starts_with("application/") && mime.ends_with("+json"))
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
