use crate::model::ModelHandle;

/// Shared application state for API handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Classifier loaded at startup; never replaced afterwards.
    pub model: ModelHandle,
}

impl AppState {
    pub fn new(model: ModelHandle) -> Self {
        Self { model }
    }
}
