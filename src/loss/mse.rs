use ndarray::Zip;

use super::{count, LossFn};
use crate::math::tensor::Tensor;

#[derive(Debug, Clone, Copy, Default)]
pub struct MseLoss;

impl LossFn for MseLoss {
    /// mean((y_true - y_pred)²) over every element.
    fn value(&self, y_true: &Tensor, y_pred: &Tensor) -> f64 {
        Zip::from(y_true)
            .and(y_pred)
            .fold(0.0, |acc, &y, &p| acc + (y - p).powi(2))
            / count(y_true)
    }

    /// 2·(y_pred - y_true) / n
    fn derivative(&self, y_true: &Tensor, y_pred: &Tensor) -> Tensor {
        let n = count(y_true);
        Zip::from(y_true)
            .and(y_pred)
            .map_collect(|&y, &p| 2.0 * (p - y) / n)
    }
}
