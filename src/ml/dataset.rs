//! Labelled training data for the offline trainer.

use anyhow::{anyhow, bail, Context};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::Path;

use crate::domain::{class_index, CLASS_NAMES, FEATURE_COUNT};
use crate::error::{IrisError, Result};

/// The classic 150-row iris measurements, bundled so `train` works offline.
const IRIS_CSV: &str = include_str!("../../data/iris.csv");

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub features: [f64; FEATURE_COUNT],
    pub label: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub samples: Vec<Sample>,
}

impl Dataset {
    /// Bundled iris dataset.
    pub fn iris() -> Result<Self> {
        Self::from_csv_str(IRIS_CSV)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading dataset {}", path.display()))?;
        Self::from_csv_str(&content)
    }

    /// Parse `f1,f2,f3,f4,label` rows. The label is a class name or index; a
    /// leading header row and blank lines are skipped.
    pub fn from_csv_str(content: &str) -> Result<Self> {
        let mut samples = Vec::new();

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if samples.is_empty() && is_header(line) {
                continue;
            }
            let sample =
                parse_row(line).with_context(|| format!("line {}: {line:?}", line_no + 1))?;
            samples.push(sample);
        }

        if samples.is_empty() {
            return Err(IrisError::Dataset("dataset has no rows".to_string()));
        }

        Ok(Self { samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Rows per class, in label order.
    pub fn class_counts(&self) -> [usize; CLASS_NAMES.len()] {
        let mut counts = [0; CLASS_NAMES.len()];
        for s in &self.samples {
            counts[s.label] += 1;
        }
        counts
    }

    /// Seeded shuffle, then cut `test_fraction` of the rows off as a test set.
    /// The training side always keeps at least one row.
    pub fn split(&self, test_fraction: f64, seed: u64) -> Result<(Dataset, Dataset)> {
        if !(0.0..1.0).contains(&test_fraction) {
            return Err(IrisError::Validation(format!(
                "test_fraction must be in [0, 1), got {test_fraction}"
            )));
        }

        let mut rows = self.samples.clone();
        let mut rng = StdRng::seed_from_u64(seed);
        rows.shuffle(&mut rng);

        let test_len = ((rows.len() as f64) * test_fraction).round() as usize;
        let test_len = test_len.min(rows.len().saturating_sub(1));
        let train = rows.split_off(test_len);

        Ok((Dataset { samples: train }, Dataset { samples: rows }))
    }
}

fn is_header(line: &str) -> bool {
    line.split(',')
        .next()
        .map(|first| first.trim().parse::<f64>().is_err())
        .unwrap_or(false)
}

fn parse_row(line: &str) -> anyhow::Result<Sample> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != FEATURE_COUNT + 1 {
        bail!(
            "expected {} columns, found {}",
            FEATURE_COUNT + 1,
            fields.len()
        );
    }

    let mut features = [0.0; FEATURE_COUNT];
    for (i, raw) in fields[..FEATURE_COUNT].iter().enumerate() {
        let v: f64 = raw
            .parse()
            .with_context(|| format!("column {} is not numeric", i + 1))?;
        if !v.is_finite() {
            bail!("column {} is not finite", i + 1);
        }
        features[i] = v;
    }

    let raw_label = fields[FEATURE_COUNT];
    let label = match raw_label.parse::<usize>() {
        Ok(idx) if idx < CLASS_NAMES.len() => idx,
        Ok(idx) => bail!("class index {idx} out of range"),
        Err(_) => class_index(raw_label).ok_or_else(|| anyhow!("unknown class {raw_label:?}"))?,
    };

    Ok(Sample { features, label })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_iris_is_balanced() {
        let ds = Dataset::iris().unwrap();
        assert_eq!(ds.len(), 150);
        assert_eq!(ds.class_counts(), [50, 50, 50]);
        assert_eq!(ds.samples[0].features, [5.1, 3.5, 1.4, 0.2]);
        assert_eq!(ds.samples[0].label, 0);
    }

    #[test]
    fn accepts_numeric_labels_without_header() {
        let ds = Dataset::from_csv_str("1,2,3,4,2\n\n5,6,7,8,0\n").unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.samples[0].label, 2);
        assert_eq!(ds.samples[1].label, 0);
    }

    #[test]
    fn rejects_bad_rows() {
        assert!(Dataset::from_csv_str("1,2,3,Iris-setosa\n").is_err());
        assert!(Dataset::from_csv_str("1,2,x,4,Iris-setosa\n").is_err());
        assert!(Dataset::from_csv_str("1,2,3,4,rose\n").is_err());
        assert!(Dataset::from_csv_str("1,2,3,4,7\n").is_err());
        assert!(Dataset::from_csv_str("a,b,c,d,e\n").is_err());
    }

    #[test]
    fn split_is_seeded_and_disjoint() {
        let ds = Dataset::iris().unwrap();
        let (train_a, test_a) = ds.split(0.2, 7).unwrap();
        let (train_b, test_b) = ds.split(0.2, 7).unwrap();

        assert_eq!(test_a.len(), 30);
        assert_eq!(train_a.len(), 120);
        assert_eq!(train_a.samples, train_b.samples);
        assert_eq!(test_a.samples, test_b.samples);
    }

    #[test]
    fn split_keeps_a_training_row() {
        let ds = Dataset::from_csv_str("1,2,3,4,0\n").unwrap();
        let (train, test) = ds.split(0.9, 1).unwrap();
        assert_eq!(train.len(), 1);
        assert!(test.is_empty());

        assert!(ds.split(1.0, 1).is_err());
    }
}
