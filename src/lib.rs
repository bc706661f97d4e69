pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod ml;
pub mod model;
pub mod server;

pub use api::{create_router, AppState};
pub use config::AppConfig;
pub use domain::{FeatureVector, Prediction, CLASS_NAMES};
pub use error::{IrisError, Result};
pub use ml::{Classifier, DenseNetwork};
pub use model::{LoadStatus, ModelHandle};
