//! Binary classification metrics from predicted and true labels.
//!
//! Class 1 (churned) is the positive class. Ratios with an empty denominator
//! are reported as 0.0 rather than NaN.

use anyhow::Result;
use serde::Serialize;

/// Validation metrics computed from a confusion matrix
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    pub fn_count: usize,
}

impl ClassificationMetrics {
    /// Metric names and values in the order they are logged to the tracker
    pub fn as_logged(&self) -> [(&'static str, f64); 4] {
        [
            ("val_accuracy", self.accuracy),
            ("val_f1_score", self.f1),
            ("val_precision", self.precision),
            ("val_recall", self.recall),
        ]
    }
}

/// Compute accuracy, precision, recall and F1 for 0/1 labels
pub fn compute_metrics(y_true: &[i64], y_pred: &[i64]) -> Result<ClassificationMetrics> {
    if y_true.len() != y_pred.len() {
        anyhow::bail!(
            "Predictions ({}) and labels ({}) must have the same length",
            y_pred.len(),
            y_true.len()
        );
    }

    let mut tp: usize = 0;
    let mut fp: usize = 0;
    let mut tn: usize = 0;
    let mut fn_count: usize = 0;

    for (&label, &pred) in y_true.iter().zip(y_pred.iter()) {
        match (pred == 1, label == 1) {
            (true, true) => tp += 1,
            (true, false) => fp += 1,
            (false, false) => tn += 1,
            (false, true) => fn_count += 1,
        }
    }

    let total = tp + fp + tn + fn_count;
    let accuracy = ratio(tp + tn, total);
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_count);

    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    Ok(ClassificationMetrics {
        accuracy,
        precision,
        recall,
        f1,
        tp,
        fp,
        tn,
        fn_count,
    })
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator > 0 {
        numerator as f64 / denominator as f64
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_predictions() {
        let m = compute_metrics(&[0, 1, 1, 0], &[0, 1, 1, 0]).unwrap();
        assert!((m.accuracy - 1.0).abs() < 1e-9);
        assert!((m.precision - 1.0).abs() < 1e-9);
        assert!((m.recall - 1.0).abs() < 1e-9);
        assert!((m.f1 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_balanced_constant_positive_prediction() {
        let y_true = [1, 0, 1, 0, 1, 0];
        let m = compute_metrics(&y_true, &[1; 6]).unwrap();
        assert!((m.accuracy - 0.5).abs() < 1e-9);
        assert!((m.precision - 0.5).abs() < 1e-9);
        assert!((m.recall - 1.0).abs() < 1e-9);
        assert!((m.f1 - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_balanced_constant_negative_prediction() {
        let y_true = [1, 0, 1, 0];
        let m = compute_metrics(&y_true, &[0; 4]).unwrap();
        assert!((m.accuracy - 0.5).abs() < 1e-9);
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1, 0.0);
        assert!(!m.f1.is_nan());
    }

    #[test]
    fn test_mixed_confusion_counts() {
        // tp=3, fp=1, tn=3, fn=1
        let y_true = [1, 1, 1, 1, 0, 0, 0, 0];
        let y_pred = [1, 1, 1, 0, 1, 0, 0, 0];
        let m = compute_metrics(&y_true, &y_pred).unwrap();
        assert_eq!((m.tp, m.fp, m.tn, m.fn_count), (3, 1, 3, 1));
        assert!((m.precision - 0.75).abs() < 1e-9);
        assert!((m.recall - 0.75).abs() < 1e-9);
        assert!((m.accuracy - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        let m = compute_metrics(&[], &[]).unwrap();
        assert_eq!(m.accuracy, 0.0);
        assert_eq!(m.f1, 0.0);
    }

    #[test]
    fn test_length_mismatch_errors() {
        assert!(compute_metrics(&[1, 0], &[1]).is_err());
    }

    #[test]
    fn test_logged_names() {
        let m = compute_metrics(&[1, 0], &[1, 0]).unwrap();
        let names: Vec<&str> = m.as_logged().iter().map(|(k, _)| *k).collect();
        assert_eq!(names, vec!["val_accuracy", "val_f1_score", "val_precision", "val_recall"]);
    }
}
