use serde::Serialize;

use crate::error::{IrisError, Result};

/// Class labels, indexed by the classifier's output.
pub const CLASS_NAMES: [&str; 3] = ["Iris-setosa", "Iris-versicolor", "Iris-virginica"];

/// Class index plus its label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Prediction {
    #[serde(rename = "prediction")]
    pub index: usize,
    pub class_name: &'static str,
}

impl Prediction {
    /// Look up the label for `index`; indices past the label list are an error.
    pub fn from_index(index: usize) -> Result<Self> {
        let class_name = CLASS_NAMES
            .get(index)
            .copied()
            .ok_or(IrisError::ClassOutOfRange {
                index,
                classes: CLASS_NAMES.len(),
            })?;
        Ok(Self { index, class_name })
    }
}

/// Position of a label in [`CLASS_NAMES`], ignoring ASCII case.
pub fn class_index(label: &str) -> Option<usize> {
    let label = label.trim();
    CLASS_NAMES
        .iter()
        .position(|name| name.eq_ignore_ascii_case(label))
}
