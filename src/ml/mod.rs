//! Classifier backends, the bundled dataset and the offline trainer.
//!
//! Inference stays CPU-only and dependency-light; ONNX support is opt-in.

pub mod classifier;
pub mod dataset;
pub mod dense;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod train;

pub use classifier::Classifier;
#[cfg(test)]
pub use classifier::MockClassifier;
pub use dataset::{Dataset, Sample};
pub use dense::{Activation, DenseLayer, DenseNetwork};
#[cfg(feature = "onnx")]
pub use onnx::OnnxModel;
pub use train::{fit, TrainConfig, TrainReport};
