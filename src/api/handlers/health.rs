use axum::{extract::State, http::StatusCode, Json};

use crate::api::{state::AppState, types::HealthResponse};

/// GET / and GET /health -- reports whether a model is loaded
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    if state.model.is_available() {
        (
            StatusCode::OK,
            Json(HealthResponse {
                status: HealthResponse::OK.to_string(),
            }),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(HealthResponse {
                status: HealthResponse::MODEL_MISSING.to_string(),
            }),
        )
    }
}
