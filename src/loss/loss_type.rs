use serde::{Serialize, Deserialize};

use super::{BceLoss, CrossEntropyLoss, HuberLoss, LossFn, MaeLoss, MseLoss};
use crate::math::tensor::Tensor;

/// Selects one of the built-in losses by name.
///
/// - `Mse`                — Mean-squared error; pair with Identity or Sigmoid output.
/// - `Mae`                — Mean absolute error; pair with Identity output.
/// - `Huber`              — Huber loss (δ=1.0); pair with Identity output.
/// - `BinaryCrossEntropy` — Binary cross-entropy; pair with Sigmoid output.
/// - `CrossEntropy`       — Categorical cross-entropy on class probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    #[default]
    Mse,
    Mae,
    Huber,
    BinaryCrossEntropy,
    CrossEntropy,
}

impl LossFn for LossType {
    fn value(&self, y_true: &Tensor, y_pred: &Tensor) -> f64 {
        match self {
            LossType::Mse => MseLoss.value(y_true, y_pred),
            LossType::Mae => MaeLoss.value(y_true, y_pred),
            LossType::Huber => HuberLoss.value(y_true, y_pred),
            LossType::BinaryCrossEntropy => BceLoss.value(y_true, y_pred),
            LossType::CrossEntropy => CrossEntropyLoss.value(y_true, y_pred),
        }
    }

    fn derivative(&self, y_true: &Tensor, y_pred: &Tensor) -> Tensor {
        match self {
            LossType::Mse => MseLoss.derivative(y_true, y_pred),
            LossType::Mae => MaeLoss.derivative(y_true, y_pred),
            LossType::Huber => HuberLoss.derivative(y_true, y_pred),
            LossType::BinaryCrossEntropy => BceLoss.derivative(y_true, y_pred),
            LossType::CrossEntropy => CrossEntropyLoss.derivative(y_true, y_pred),
        }
    }
}
