use crate::domain::FeatureVector;
use crate::error::{IrisError, Result};

/// Maps one feature vector to a class index.
///
/// Implementations are immutable once loaded and shared across request tasks.
#[cfg_attr(test, mockall::automock)]
pub trait Classifier: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<usize>;

    /// Short human-readable description for startup logs.
    fn describe(&self) -> String {
        "classifier".to_string()
    }
}

/// Class index from a raw model output.
///
/// A single element is read as a class label and rounded; anything longer is a
/// score vector resolved by argmax. Non-finite values are an inference error so a
/// NaN never collapses silently to class 0.
#[cfg_attr(not(feature = "onnx"), allow(dead_code))]
pub(crate) fn class_from_output(output: &[f64]) -> Result<usize> {
    if let Some(bad) = output.iter().find(|v| !v.is_finite()) {
        return Err(IrisError::Inference(format!(
            "model produced non-finite output {bad}"
        )));
    }
    match output {
        [] => Err(IrisError::Inference("model produced no outputs".to_string())),
        [label] if *label < 0.0 => Err(IrisError::Inference(format!(
            "model produced invalid class label {label}"
        ))),
        [label] => Ok(label.round() as usize),
        scores => Ok(crate::ml::dense::argmax(scores)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_vectors_resolve_by_argmax() {
        assert_eq!(class_from_output(&[0.1, 0.7, 0.2]).unwrap(), 1);
        assert_eq!(class_from_output(&[0.5, 0.5, 0.0]).unwrap(), 0);
    }

    #[test]
    fn single_labels_are_rounded() {
        assert_eq!(class_from_output(&[2.0]).unwrap(), 2);
        assert_eq!(class_from_output(&[0.6]).unwrap(), 1);
        assert!(class_from_output(&[-1.0]).is_err());
    }

    #[test]
    fn non_finite_outputs_are_inference_errors() {
        let outputs: [&[f64]; 4] = [
            &[f64::NAN, 0.2, 0.1],
            &[0.1, f64::INFINITY, 0.3],
            &[f64::NAN],
            &[],
        ];
        for output in outputs {
            assert!(
                matches!(class_from_output(output), Err(IrisError::Inference(_))),
                "{output:?}"
            );
        }
    }
}
