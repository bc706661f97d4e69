//! Offline fitting of the served artifact.
//!
//! Multinomial logistic regression: z-scored inputs feeding one softmax layer,
//! fit with full-batch gradient descent and a small L2 penalty.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::{CLASS_NAMES, FEATURE_COUNT};
use crate::error::{IrisError, Result};
use crate::ml::dataset::Dataset;
use crate::ml::dense::{softmax_in_place, Activation, DenseLayer, DenseNetwork};

const FEATURE_NAMES: [&str; FEATURE_COUNT] =
    ["sepal_length", "sepal_width", "petal_length", "petal_width"];

#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub l2: f64,
    /// Share of rows held out for evaluation, in [0, 1)
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 500,
            learning_rate: 0.5,
            l2: 1e-4,
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(IrisError::Validation("epochs must be > 0".to_string()));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(IrisError::Validation(
                "learning_rate must be finite and > 0".to_string(),
            ));
        }
        if !self.l2.is_finite() || self.l2 < 0.0 {
            return Err(IrisError::Validation(
                "l2 must be finite and >= 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainReport {
    pub train_samples: usize,
    pub test_samples: usize,
    pub train_accuracy: f64,
    /// `None` when no rows were held out.
    pub test_accuracy: Option<f64>,
    pub final_loss: f64,
}

/// Fit a classifier on `dataset` and return it with its evaluation report.
pub fn fit(dataset: &Dataset, cfg: &TrainConfig) -> Result<(DenseNetwork, TrainReport)> {
    cfg.validate()?;
    let (train, test) = dataset.split(cfg.test_fraction, cfg.seed)?;
    info!(
        train = train.len(),
        test = test.len(),
        epochs = cfg.epochs,
        "fitting softmax regression"
    );

    let (mean, std) = standardization(&train);
    let inputs: Vec<[f64; FEATURE_COUNT]> = train
        .samples
        .iter()
        .map(|s| {
            let mut x = s.features;
            for j in 0..FEATURE_COUNT {
                x[j] = (x[j] - mean[j]) / std[j];
            }
            x
        })
        .collect();

    let classes = CLASS_NAMES.len();
    let n = inputs.len() as f64;
    let mut weights = vec![vec![0.0_f64; FEATURE_COUNT]; classes];
    let mut bias = vec![0.0_f64; classes];
    let mut loss = f64::NAN;

    for epoch in 0..cfg.epochs {
        let mut grad_w = vec![vec![0.0_f64; FEATURE_COUNT]; classes];
        let mut grad_b = vec![0.0_f64; classes];
        let mut total_loss = 0.0;

        for (x, sample) in inputs.iter().zip(&train.samples) {
            let mut p: Vec<f64> = weights
                .iter()
                .zip(&bias)
                .map(|(row, b)| row.iter().zip(x).fold(*b, |acc, (w, v)| acc + w * v))
                .collect();
            softmax_in_place(&mut p);
            total_loss -= p[sample.label].max(1e-15).ln();

            for k in 0..classes {
                let err = p[k] - if k == sample.label { 1.0 } else { 0.0 };
                grad_b[k] += err;
                for j in 0..FEATURE_COUNT {
                    grad_w[k][j] += err * x[j];
                }
            }
        }

        for k in 0..classes {
            bias[k] -= cfg.learning_rate * grad_b[k] / n;
            for j in 0..FEATURE_COUNT {
                let g = grad_w[k][j] / n + cfg.l2 * weights[k][j];
                weights[k][j] -= cfg.learning_rate * g;
            }
        }

        loss = total_loss / n;
        if epoch % 100 == 0 {
            debug!(epoch, loss, "training progress");
        }
    }

    let mut network = DenseNetwork {
        input_dim: FEATURE_COUNT,
        input_mean: Some(mean.to_vec()),
        input_std: Some(std.to_vec()),
        layers: vec![DenseLayer {
            weights,
            bias,
            activation: Activation::Softmax,
        }],
        metadata: serde_json::Value::Null,
    };
    network.validate().map_err(IrisError::Model)?;

    let report = TrainReport {
        train_samples: train.len(),
        test_samples: test.len(),
        train_accuracy: accuracy(&network, &train)?,
        test_accuracy: if test.is_empty() {
            None
        } else {
            Some(accuracy(&network, &test)?)
        },
        final_loss: loss,
    };

    network.metadata = serde_json::json!({
        "model_type": "softmax_regression",
        "class_names": CLASS_NAMES,
        "feature_names": FEATURE_NAMES,
        "trained_at": Utc::now().to_rfc3339(),
        "epochs": cfg.epochs,
        "learning_rate": cfg.learning_rate,
        "l2": cfg.l2,
        "seed": cfg.seed,
        "report": &report,
    });

    info!(
        train_accuracy = report.train_accuracy,
        test_accuracy = ?report.test_accuracy,
        loss = report.final_loss,
        "training finished"
    );

    Ok((network, report))
}

/// Share of rows whose predicted class matches the label.
pub fn accuracy(network: &DenseNetwork, dataset: &Dataset) -> Result<f64> {
    if dataset.is_empty() {
        return Err(IrisError::Dataset("cannot score an empty dataset".to_string()));
    }
    let mut hits = 0usize;
    for s in &dataset.samples {
        if network.predict_class(&s.features)? == s.label {
            hits += 1;
        }
    }
    Ok(hits as f64 / dataset.len() as f64)
}

/// Per-column mean and population std; constant columns get std 1.
fn standardization(dataset: &Dataset) -> ([f64; FEATURE_COUNT], [f64; FEATURE_COUNT]) {
    let n = dataset.len() as f64;
    let mut mean = [0.0; FEATURE_COUNT];
    for s in &dataset.samples {
        for j in 0..FEATURE_COUNT {
            mean[j] += s.features[j] / n;
        }
    }

    let mut std = [0.0; FEATURE_COUNT];
    for s in &dataset.samples {
        for j in 0..FEATURE_COUNT {
            std[j] += (s.features[j] - mean[j]).powi(2) / n;
        }
    }
    for v in std.iter_mut() {
        *v = v.sqrt();
        if !v.is_finite() || *v < 1e-12 {
            *v = 1.0;
        }
    }

    (mean, std)
}
