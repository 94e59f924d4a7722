use ndarray::Zip;

use super::{count, LossFn};
use crate::math::tensor::Tensor;

#[derive(Debug, Clone, Copy, Default)]
pub struct MaeLoss;

impl LossFn for MaeLoss {
    /// mean(|y_pred - y_true|)
    fn value(&self, y_true: &Tensor, y_pred: &Tensor) -> f64 {
        Zip::from(y_true)
            .and(y_pred)
            .fold(0.0, |acc, &y, &p| acc + (p - y).abs())
            / count(y_true)
    }

    /// Subgradient sign(y_pred - y_true) / n, 0 when equal.
    fn derivative(&self, y_true: &Tensor, y_pred: &Tensor) -> Tensor {
        let n = count(y_true);
        Zip::from(y_true).and(y_pred).map_collect(|&y, &p| {
            let diff = p - y;
            if diff > 0.0 { 1.0 / n } else if diff < 0.0 { -1.0 / n } else { 0.0 }
        })
    }
}
