use ndarray::Zip;

use super::LossFn;
use crate::math::tensor::Tensor;

/// Small epsilon added inside log() to prevent log(0) = -inf.
const EPS: f64 = 1e-12;

/// Categorical cross-entropy over rows of class probabilities, averaged over
/// the batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossEntropyLoss;

fn batch_size(t: &Tensor) -> f64 {
    t.shape().first().copied().unwrap_or(1).max(1) as f64
}

impl LossFn for CrossEntropyLoss {
    /// L = -Σ y·log(p + ε) / batch
    fn value(&self, y_true: &Tensor, y_pred: &Tensor) -> f64 {
        Zip::from(y_true)
            .and(y_pred)
            .fold(0.0, |acc, &y, &p| acc - y * (p + EPS).ln())
            / batch_size(y_true)
    }

    /// ∂L/∂p = -y / (p + ε) / batch
    fn derivative(&self, y_true: &Tensor, y_pred: &Tensor) -> Tensor {
        let n = batch_size(y_true);
        Zip::from(y_true)
            .and(y_pred)
            .map_collect(|&y, &p| -y / (p + EPS) / n)
    }
}
