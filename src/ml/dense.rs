//! Dense network inference (CPU-only).
//!
//! Small MLPs loaded from JSON. The artifact written by `train` is a single
//! softmax layer over z-scored inputs (multinomial logistic regression), but any
//! stack of dense layers whose output has one score per class is accepted.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::FeatureVector;
use crate::error::{IrisError, Result};
use crate::ml::Classifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Linear,
    Relu,
    Tanh,
    Sigmoid,
    /// Normalizes the whole layer output into a probability distribution.
    Softmax,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    /// Weights shape: [out_dim][in_dim]
    pub weights: Vec<Vec<f64>>,
    /// Bias shape: [out_dim]
    pub bias: Vec<f64>,
    #[serde(default)]
    pub activation: Activation,
}

impl DenseLayer {
    fn in_dim(&self) -> usize {
        self.weights.first().map(|r| r.len()).unwrap_or(0)
    }

    fn out_dim(&self) -> usize {
        self.weights.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseNetwork {
    /// Expected input dimension.
    pub input_dim: usize,

    /// Optional z-score normalization.
    #[serde(default)]
    pub input_mean: Option<Vec<f64>>,
    #[serde(default)]
    pub input_std: Option<Vec<f64>>,

    pub layers: Vec<DenseLayer>,

    /// Optional free-form metadata (training info, class names, etc).
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl DenseNetwork {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let model: Self = serde_json::from_str(content)?;
        model.validate().map_err(IrisError::Model)?;
        Ok(model)
    }

    /// Write the network as pretty JSON, creating parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.input_dim == 0 {
            return Err("input_dim must be > 0".to_string());
        }
        if self.layers.is_empty() {
            return Err("layers must not be empty".to_string());
        }
        if let (Some(mean), Some(std)) = (&self.input_mean, &self.input_std) {
            if mean.len() != self.input_dim {
                return Err(format!(
                    "input_mean length {} != input_dim {}",
                    mean.len(),
                    self.input_dim
                ));
            }
            if std.len() != self.input_dim {
                return Err(format!(
                    "input_std length {} != input_dim {}",
                    std.len(),
                    self.input_dim
                ));
            }
            if mean.iter().any(|v| !v.is_finite()) {
                return Err("input_mean must be finite".to_string());
            }
            if std.iter().any(|v| !v.is_finite() || *v <= 0.0) {
                return Err("input_std must be finite and > 0".to_string());
            }
        } else if self.input_mean.is_some() || self.input_std.is_some() {
            return Err("input_mean and input_std must be provided together".to_string());
        }

        let mut expected_in = self.input_dim;
        for (idx, layer) in self.layers.iter().enumerate() {
            if layer.out_dim() == 0 {
                return Err(format!("layer[{idx}] out_dim must be > 0"));
            }
            if layer.bias.len() != layer.out_dim() {
                return Err(format!(
                    "layer[{idx}] bias len {} != out_dim {}",
                    layer.bias.len(),
                    layer.out_dim()
                ));
            }
            for (r, row) in layer.weights.iter().enumerate() {
                if row.len() != expected_in {
                    return Err(format!(
                        "layer[{idx}] weights row {r} len {} != expected in_dim {expected_in}",
                        row.len()
                    ));
                }
                if row.iter().any(|v| !v.is_finite()) {
                    return Err(format!("layer[{idx}] weights contain non-finite values"));
                }
            }
            if layer.bias.iter().any(|v| !v.is_finite()) {
                return Err(format!("layer[{idx}] bias contain non-finite values"));
            }
            expected_in = layer.out_dim();
        }
        Ok(())
    }

    pub fn output_dim(&self) -> usize {
        self.layers.last().map(|l| l.out_dim()).unwrap_or(0)
    }

    pub fn forward(&self, input: &[f64]) -> Result<Vec<f64>> {
        if input.len() != self.input_dim {
            return Err(IrisError::Inference(format!(
                "DenseNetwork input dim mismatch: got {}, expected {}",
                input.len(),
                self.input_dim
            )));
        }

        let mut x: Vec<f64> = input.to_vec();

        if let (Some(mean), Some(std)) = (&self.input_mean, &self.input_std) {
            for i in 0..x.len() {
                let denom = std[i].max(1e-12);
                x[i] = saturate((x[i] - mean[i]) / denom);
            }
        }

        for layer in &self.layers {
            let in_dim = layer.in_dim();

            let mut y: Vec<f64> = layer
                .weights
                .iter()
                .zip(&layer.bias)
                .map(|(row, bias)| {
                    debug_assert_eq!(row.len(), in_dim);
                    row.iter()
                        .zip(&x)
                        .fold(*bias, |acc, (w, v)| saturate(acc + saturate(w * v)))
                })
                .collect();

            if layer.activation == Activation::Softmax {
                softmax_in_place(&mut y);
            } else {
                for v in y.iter_mut() {
                    *v = apply_activation(*v, layer.activation);
                }
            }
            x = y;
        }

        if x.iter().any(|v| !v.is_finite()) {
            return Err(IrisError::Inference(
                "DenseNetwork produced non-finite output".to_string(),
            ));
        }

        Ok(x)
    }

    /// Index of the winning class. One-output networks are binary with a 0.5 cut.
    pub fn predict_class(&self, input: &[f64]) -> Result<usize> {
        let out = self.forward(input)?;
        match out.as_slice() {
            [] => Err(IrisError::Inference(
                "DenseNetwork produced no outputs".to_string(),
            )),
            [p] => Ok(usize::from(*p >= 0.5)),
            scores => Ok(argmax(scores)),
        }
    }
}

impl Classifier for DenseNetwork {
    fn predict(&self, features: &FeatureVector) -> Result<usize> {
        self.predict_class(features.as_slice())
    }

    fn describe(&self) -> String {
        format!(
            "dense network ({} -> {}, {} layers)",
            self.input_dim,
            self.output_dim(),
            self.layers.len()
        )
    }
}

/// Clamp into the finite range. Inputs are never NaN here, so huge but valid
/// features saturate instead of turning `inf - inf` into NaN downstream.
fn saturate(x: f64) -> f64 {
    x.clamp(-f64::MAX, f64::MAX)
}

/// First index of the maximum; ties go to the lowest index.
pub(crate) fn argmax(scores: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in scores.iter().enumerate().skip(1) {
        if *v > scores[best] {
            best = i;
        }
    }
    best
}

fn apply_activation(x: f64, act: Activation) -> f64 {
    match act {
        Activation::Linear | Activation::Softmax => x,
        Activation::Relu => x.max(0.0),
        Activation::Tanh => x.tanh(),
        Activation::Sigmoid => sigmoid(x),
    }
}

fn sigmoid(x: f64) -> f64 {
    // Numerically-stable sigmoid.
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

pub(crate) fn softmax_in_place(v: &mut [f64]) {
    let max = v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for x in v.iter_mut() {
        *x = (*x - max).exp();
        sum += *x;
    }
    if sum > 0.0 {
        for x in v.iter_mut() {
            *x /= sum;
        }
    }
}
