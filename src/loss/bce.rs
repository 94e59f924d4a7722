use ndarray::Zip;

use super::{count, LossFn};
use crate::math::tensor::Tensor;

const EPS: f64 = 1e-12;

/// Binary cross-entropy for sigmoid outputs in (0, 1).
#[derive(Debug, Clone, Copy, Default)]
pub struct BceLoss;

impl LossFn for BceLoss {
    /// -mean(y·log(p+ε) + (1-y)·log(1-p+ε))
    fn value(&self, y_true: &Tensor, y_pred: &Tensor) -> f64 {
        Zip::from(y_true)
            .and(y_pred)
            .fold(0.0, |acc, &y, &p| {
                acc - (y * (p + EPS).ln() + (1.0 - y) * (1.0 - p + EPS).ln())
            })
            / count(y_true)
    }

    /// (-y/(p+ε) + (1-y)/(1-p+ε)) / n
    fn derivative(&self, y_true: &Tensor, y_pred: &Tensor) -> Tensor {
        let n = count(y_true);
        Zip::from(y_true)
            .and(y_pred)
            .map_collect(|&y, &p| (-y / (p + EPS) + (1.0 - y) / (1.0 - p + EPS)) / n)
    }
}
