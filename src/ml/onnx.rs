//! ONNX inference wrapper (pure Rust via `tract-onnx`).
//!
//! Lets an artifact exported from another toolchain be served without Python.

use crate::domain::{FeatureVector, FEATURE_COUNT};
use crate::error::{IrisError, Result};
use crate::ml::classifier::class_from_output;
use crate::ml::Classifier;

use tract_onnx::prelude::*;

#[derive(Clone)]
pub struct OnnxModel {
    plan: TypedRunnableModel<TypedModel>,
    input_shape: Vec<usize>,
    output_dim: usize,
}

impl std::fmt::Debug for OnnxModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxModel")
            .field("input_shape", &self.input_shape)
            .field("output_dim", &self.output_dim)
            .finish()
    }
}

impl OnnxModel {
    /// Load an ONNX model and specialize it to a fixed `[1, FEATURE_COUNT]` f32 input.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| IrisError::Model(format!("onnx load failed: {e}")))?;
        Self::specialize(model)
    }

    /// Same as [`OnnxModel::load`] for a graph already decoded in memory.
    pub fn from_proto(proto: &tract_onnx::pb::ModelProto) -> Result<Self> {
        let model = tract_onnx::onnx()
            .model_for_proto_model(proto)
            .map_err(|e| IrisError::Model(format!("onnx load failed: {e}")))?;
        Self::specialize(model)
    }

    fn specialize(model: InferenceModel) -> Result<Self> {
        let input_shape = [1, FEATURE_COUNT];
        let model = model
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(input_shape[0], input_shape[1])),
            )
            .map_err(|e| IrisError::Model(format!("onnx input fact failed: {e}")))?;

        let plan = model
            .into_optimized()
            .map_err(|e| IrisError::Model(format!("onnx optimize failed: {e}")))?
            .into_runnable()
            .map_err(|e| IrisError::Model(format!("onnx runnable failed: {e}")))?;

        // Infer output_dim by running a dummy forward pass.
        let dummy = tract_ndarray::ArrayD::<f32>::zeros(tract_ndarray::IxDyn(&input_shape))
            .into_tvalue();
        let outputs = plan
            .run(tvec!(dummy))
            .map_err(|e| IrisError::Model(format!("onnx run failed: {e}")))?;
        let out0 = outputs
            .first()
            .ok_or_else(|| IrisError::Model("onnx produced no outputs".to_string()))?;
        let output_dim = out0.len();
        if output_dim == 0 {
            return Err(IrisError::Model(
                "onnx output has zero elements".to_string(),
            ));
        }

        Ok(Self {
            plan,
            input_shape: input_shape.to_vec(),
            output_dim,
        })
    }

    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    /// Raw first output for a single feature vector, cast to f64.
    pub fn scores(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        let tensor = tract_ndarray::ArrayD::<f32>::from_shape_vec(
            tract_ndarray::IxDyn(&self.input_shape),
            features.to_f32().to_vec(),
        )
        .map_err(|e| IrisError::Inference(format!("onnx input reshape failed: {e}")))?
        .into_tvalue();

        let outputs = self
            .plan
            .run(tvec!(tensor))
            .map_err(|e| IrisError::Inference(format!("onnx run failed: {e}")))?;
        let out0 = outputs
            .first()
            .ok_or_else(|| IrisError::Inference("onnx produced no outputs".to_string()))?;

        // Exported classifiers emit either int64 labels or f32 scores.
        let out0 = out0
            .cast_to::<f64>()
            .map_err(|e| IrisError::Inference(format!("onnx output decode failed: {e}")))?;
        let arr = out0
            .to_array_view::<f64>()
            .map_err(|e| IrisError::Inference(format!("onnx output decode failed: {e}")))?;

        Ok(arr.iter().copied().collect())
    }
}

impl Classifier for OnnxModel {
    fn predict(&self, features: &FeatureVector) -> Result<usize> {
        class_from_output(&self.scores(features)?)
    }

    fn describe(&self) -> String {
        format!("onnx model ({:?} -> {})", self.input_shape, self.output_dim)
    }
}
