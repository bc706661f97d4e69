//! Startup model loading.
//!
//! The artifact is read exactly once. A missing or unreadable artifact never
//! stops the process: the handle records why it is unavailable and the HTTP
//! layer reports it.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::{ModelConfig, ModelFormat};
use crate::error::{IrisError, Result};
use crate::ml::{Classifier, DenseNetwork};

/// Outcome of the startup load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Loaded,
    /// No file at the configured path.
    Missing,
    /// File present but unusable.
    Failed(String),
}

impl LoadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loaded => "loaded",
            Self::Missing => "missing",
            Self::Failed(_) => "failed",
        }
    }
}

/// Read-only handle to the classifier, shared by every request.
#[derive(Clone)]
pub struct ModelHandle {
    classifier: Option<Arc<dyn Classifier>>,
    status: LoadStatus,
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("status", &self.status)
            .field(
                "classifier",
                &self.classifier.as_ref().map(|c| c.describe()),
            )
            .finish()
    }
}

impl ModelHandle {
    pub fn ready(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            classifier: Some(classifier),
            status: LoadStatus::Loaded,
        }
    }

    pub fn missing() -> Self {
        Self {
            classifier: None,
            status: LoadStatus::Missing,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            classifier: None,
            status: LoadStatus::Failed(reason.into()),
        }
    }

    /// Load the configured artifact, logging the outcome.
    pub fn load(cfg: &ModelConfig) -> Self {
        let path = cfg.path.as_path();
        if !path.exists() {
            warn!(path = %path.display(), "model artifact not found");
            return Self::missing();
        }

        match load_classifier(path, cfg.format) {
            Ok(classifier) => {
                info!(
                    path = %path.display(),
                    format = cfg.format.as_str(),
                    model = %classifier.describe(),
                    "model loaded"
                );
                Self::ready(classifier)
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to load model");
                Self::failed(e.to_string())
            }
        }
    }

    pub fn classifier(&self) -> Option<&Arc<dyn Classifier>> {
        self.classifier.as_ref()
    }

    pub fn is_available(&self) -> bool {
        self.classifier.is_some()
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }
}

fn load_classifier(path: &Path, format: ModelFormat) -> Result<Arc<dyn Classifier>> {
    match format {
        ModelFormat::DenseJson => {
            let network = DenseNetwork::from_file(path)?;
            if network.input_dim != crate::domain::FEATURE_COUNT {
                return Err(IrisError::Model(format!(
                    "model expects {} inputs, service provides {}",
                    network.input_dim,
                    crate::domain::FEATURE_COUNT
                )));
            }
            Ok(Arc::new(network))
        }
        #[cfg(feature = "onnx")]
        ModelFormat::Onnx => Ok(Arc::new(crate::ml::OnnxModel::load(path)?)),
        #[cfg(not(feature = "onnx"))]
        ModelFormat::Onnx => Err(IrisError::UnsupportedFormat(
            "onnx (rebuild with the `onnx` feature)".to_string(),
        )),
    }
}
