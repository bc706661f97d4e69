use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::{handlers, state::AppState};

pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health endpoints
        .route("/", get(handlers::health_handler))
        .route("/health", get(handlers::health_handler))
        // Prediction endpoint
        .route("/predict", post(handlers::predict_handler))
        // Add state, CORS and request tracing
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
