use ndarray::Zip;

use super::{count, LossFn};
use crate::math::tensor::Tensor;

const DELTA: f64 = 1.0;

/// Huber loss with δ = 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct HuberLoss;

impl LossFn for HuberLoss {
    /// mean(h(y_pred − y_true))
    /// where h(x) = 0.5·x²  if |x| ≤ δ
    ///              δ·(|x| − 0.5·δ)  otherwise
    fn value(&self, y_true: &Tensor, y_pred: &Tensor) -> f64 {
        Zip::from(y_true)
            .and(y_pred)
            .fold(0.0, |acc, &y, &p| {
                let x = p - y;
                acc + if x.abs() <= DELTA {
                    0.5 * x * x
                } else {
                    DELTA * (x.abs() - 0.5 * DELTA)
                }
            })
            / count(y_true)
    }

    /// (x if |x| ≤ δ, else δ·sign(x)) / n
    fn derivative(&self, y_true: &Tensor, y_pred: &Tensor) -> Tensor {
        let n = count(y_true);
        Zip::from(y_true).and(y_pred).map_collect(|&y, &p| {
            let x = p - y;
            (if x.abs() <= DELTA { x } else { DELTA * x.signum() }) / n
        })
    }
}
