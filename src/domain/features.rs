use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Number of measurements per instance (sepal length/width, petal length/width).
pub const FEATURE_COUNT: usize = 4;

/// The measurements of one instance to classify.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

/// Why a JSON value could not become a [`FeatureVector`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureError {
    #[error("features must be a list")]
    NotAList,

    #[error("expected {expected} features, got {got}")]
    WrongLength { expected: usize, got: usize },

    #[error("feature at position {position} is not numeric")]
    NonNumeric { position: usize },
}

impl FeatureVector {
    /// Build from raw values; every value must be finite.
    pub fn new(values: [f64; FEATURE_COUNT]) -> Result<Self, FeatureError> {
        if let Some(position) = values.iter().position(|v| !v.is_finite()) {
            return Err(FeatureError::NonNumeric { position });
        }
        Ok(Self(values))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn values(&self) -> [f64; FEATURE_COUNT] {
        self.0
    }

    /// Narrow to f32, saturating values beyond the f32 range instead of
    /// producing infinities.
    pub fn to_f32(&self) -> [f32; FEATURE_COUNT] {
        self.0.map(|v| v.clamp(f32::MIN as f64, f32::MAX as f64) as f32)
    }
}

impl fmt::Display for FeatureVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

impl TryFrom<&Value> for FeatureVector {
    type Error = FeatureError;

    /// Checks run in order: list shape, length, then per-element conversion.
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let items = value.as_array().ok_or(FeatureError::NotAList)?;
        if items.len() != FEATURE_COUNT {
            return Err(FeatureError::WrongLength {
                expected: FEATURE_COUNT,
                got: items.len(),
            });
        }

        let mut values = [0.0_f64; FEATURE_COUNT];
        for (position, item) in items.iter().enumerate() {
            values[position] = coerce_number(item).ok_or(FeatureError::NonNumeric { position })?;
        }
        Self::new(values)
    }
}

/// Numbers, numeric strings and booleans convert; everything else does not.
fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    n.is_finite().then_some(n)
}
