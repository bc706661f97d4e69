use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ============================================================================
// Health Check Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub const OK: &'static str = "ok";
    pub const MODEL_MISSING: &'static str = "model-missing";
}

// ============================================================================
// Prediction Types
// ============================================================================

/// Body of `POST /predict`.
///
/// `features` stays untyped here; shape checks happen when it is turned into a
/// `FeatureVector` so each failure gets its own message.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    /// `Some(Value::Null)` when the key is present with a null value.
    #[serde(default, deserialize_with = "present")]
    pub features: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictResponse {
    pub prediction: usize,
    pub class_name: String,
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}
