use thiserror::Error;

/// Main error type for the prediction service
#[derive(Error, Debug)]
pub enum IrisError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Model artifact errors
    #[error("Model error: {0}")]
    Model(String),

    #[error("Unsupported model format: {0}")]
    UnsupportedFormat(String),

    // Inference errors
    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Class index {index} out of range for {classes} classes")]
    ClassOutOfRange { index: usize, classes: usize },

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // Dataset errors
    #[error("Dataset error: {0}")]
    Dataset(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for IrisError
pub type Result<T> = std::result::Result<T, IrisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_message() {
        let err = IrisError::ClassOutOfRange {
            index: 7,
            classes: 3,
        };
        assert_eq!(err.to_string(), "Class index 7 out of range for 3 classes");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: IrisError = io.into();
        assert!(matches!(err, IrisError::Io(_)));
    }
}
