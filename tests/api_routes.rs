use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use iris_predict::{
    api::{create_router, AppState},
    error::{IrisError, Result},
    ml::{fit, Dataset, TrainConfig},
    Classifier, FeatureVector, ModelHandle, CLASS_NAMES,
};
use serde_json::{json, Value};
use std::sync::{Arc, OnceLock};
use tower::ServiceExt;

fn trained_model() -> ModelHandle {
    static MODEL: OnceLock<ModelHandle> = OnceLock::new();
    MODEL
        .get_or_init(|| {
            let dataset = Dataset::iris().expect("bundled dataset");
            let (network, _) = fit(&dataset, &TrainConfig::default()).expect("training");
            ModelHandle::ready(Arc::new(network))
        })
        .clone()
}

fn app_with(model: ModelHandle) -> Router {
    create_router(AppState::new(model))
}

struct Failing;

impl Classifier for Failing {
    fn predict(&self, _features: &FeatureVector) -> Result<usize> {
        Err(IrisError::Inference("backend crashed: secret detail".to_string()))
    }
}

struct Fixed(usize);

impl Classifier for Fixed {
    fn predict(&self, _features: &FeatureVector) -> Result<usize> {
        Ok(self.0)
    }
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    content_type: Option<&str>,
    body: &str,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(ct) = content_type {
        builder = builder.header("content-type", ct);
    }
    let request = builder
        .body(Body::from(body.to_string()))
        .expect("failed to build request");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router request failed");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, value)
}

async fn predict(app: &Router, body: Value) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/predict",
        Some("application/json"),
        &body.to_string(),
    )
    .await
}

#[tokio::test]
async fn health_ok_when_model_loaded() {
    let app = app_with(trained_model());
    for uri in ["/", "/health"] {
        let (status, body) = send(&app, Method::GET, uri, None, "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }
}

#[tokio::test]
async fn health_reports_missing_model() {
    let app = app_with(ModelHandle::missing());
    for uri in ["/", "/health"] {
        let (status, body) = send(&app, Method::GET, uri, None, "").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"status": "model-missing"}));
    }
}

#[tokio::test]
async fn failed_load_also_reports_missing() {
    let app = app_with(ModelHandle::failed("corrupt artifact"));
    let (status, body) = send(&app, Method::GET, "/health", None, "").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "model-missing");
}

#[tokio::test]
async fn predicts_setosa() {
    let app = app_with(trained_model());
    let (status, body) = predict(&app, json!({"features": [5.1, 3.5, 1.4, 0.2]})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"prediction": 0, "class_name": "Iris-setosa"}));
}

#[tokio::test]
async fn predictions_stay_in_label_range() {
    let app = app_with(trained_model());
    let dataset = Dataset::iris().unwrap();
    for sample in dataset.samples.iter().step_by(7) {
        let (status, body) = predict(&app, json!({"features": sample.features})).await;
        assert_eq!(status, StatusCode::OK, "{body}");

        let index = body["prediction"].as_u64().expect("integer prediction") as usize;
        assert!(index < CLASS_NAMES.len());
        assert_eq!(body["class_name"], CLASS_NAMES[index]);
    }
}

#[tokio::test]
async fn extreme_but_finite_features_still_predict() {
    let app = app_with(trained_model());
    for features in [
        json!([1e308, -1e308, 1e308, 0]),
        json!([1e308, 1e308, 1e308, 1e308]),
        json!([-1e308, 3.5, 1.4, 0.2]),
    ] {
        let (status, body) = predict(&app, json!({"features": features})).await;
        assert_eq!(status, StatusCode::OK, "{features} -> {body}");

        let index = body["prediction"].as_u64().expect("integer prediction") as usize;
        assert!(index < CLASS_NAMES.len());
        assert_eq!(body["class_name"], CLASS_NAMES[index]);
    }
}

#[tokio::test]
async fn identical_requests_get_identical_answers() {
    let app = app_with(trained_model());
    let payload = json!({"features": [6.3, 2.8, 5.1, 1.5]});
    let first = predict(&app, payload.clone()).await;
    for _ in 0..5 {
        assert_eq!(predict(&app, payload.clone()).await, first);
    }
}

#[tokio::test]
async fn wrong_feature_count_is_400() {
    let app = app_with(trained_model());
    let (status, body) = predict(&app, json!({"features": [5.1, 3.5, 1.4]})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Se requieren 4 features"}));

    let (status, _) = predict(&app, json!({"features": [5.1, 3.5, 1.4, 0.2, 0.1]})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_numeric_feature_is_400() {
    let app = app_with(trained_model());
    let (status, body) = predict(&app, json!({"features": ["a", 3.5, 1.4, 0.2]})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": "Todas las features deben ser numéricas"})
    );
}

#[tokio::test]
async fn numeric_strings_are_accepted() {
    let app = app_with(trained_model());
    let (status, body) = predict(&app, json!({"features": ["5.1", "3.5", "1.4", "0.2"]})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], 0);
}

#[tokio::test]
async fn malformed_requests_are_400() {
    let app = app_with(trained_model());

    let (status, body) = predict(&app, json!({"values": [5.1, 3.5, 1.4, 0.2]})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Campo \"features\" requerido"}));

    let (status, body) = predict(&app, json!({"features": {"a": 1}})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Features debe ser lista"}));

    let (status, body) = send(
        &app,
        Method::POST,
        "/predict",
        Some("text/plain"),
        r#"{"features":[5.1,3.5,1.4,0.2]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": "Content-Type debe ser application/json"})
    );

    let (status, body) = send(&app, Method::POST, "/predict", None, "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": "Content-Type debe ser application/json"})
    );

    let (status, body) = send(
        &app,
        Method::POST,
        "/predict",
        Some("application/json"),
        "",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Body vacío"}));

    let (status, body) = send(
        &app,
        Method::POST,
        "/predict",
        Some("application/json; charset=utf-8"),
        "{not json",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Body vacío"}));
}

#[tokio::test]
async fn predict_without_model_is_500() {
    let app = app_with(ModelHandle::missing());
    let (status, body) = predict(&app, json!({"features": [5.1, 3.5, 1.4, 0.2]})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Modelo no disponible"}));

    // Availability is checked before anything about the request itself.
    let (status, _) = send(&app, Method::POST, "/predict", Some("text/plain"), "").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn inference_failure_does_not_leak_details() {
    let app = app_with(ModelHandle::ready(Arc::new(Failing)));
    let (status, body) = predict(&app, json!({"features": [5.1, 3.5, 1.4, 0.2]})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Error interno en predicción"}));
}

#[tokio::test]
async fn out_of_range_class_is_500() {
    let app = app_with(ModelHandle::ready(Arc::new(Fixed(5))));
    let (status, body) = predict(&app, json!({"features": [5.1, 3.5, 1.4, 0.2]})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Error interno en predicción"}));
}

#[tokio::test]
async fn wrong_methods_are_rejected() {
    let app = app_with(trained_model());
    let (status, _) = send(&app, Method::GET, "/predict", None, "").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = send(&app, Method::POST, "/health", None, "").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
