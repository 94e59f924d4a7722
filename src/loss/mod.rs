pub mod bce;
pub mod cross_entropy;
pub mod huber;
pub mod loss_type;
pub mod mae;
pub mod mse;

use std::fmt;

use crate::math::tensor::Tensor;

pub use bce::BceLoss;
pub use cross_entropy::CrossEntropyLoss;
pub use huber::HuberLoss;
pub use loss_type::LossType;
pub use mae::MaeLoss;
pub use mse::MseLoss;

/// The loss a `Network` minimises: a scalar value and its gradient with
/// respect to the prediction.
///
/// Callers guarantee `y_true` and `y_pred` have the same shape; `derivative`
/// returns a tensor of that shape.
pub trait LossFn: fmt::Debug {
    fn value(&self, y_true: &Tensor, y_pred: &Tensor) -> f64;
    fn derivative(&self, y_true: &Tensor, y_pred: &Tensor) -> Tensor;
}

/// A loss assembled from a plain value/derivative function pair.
#[derive(Clone, Copy)]
pub struct FnLoss {
    pub value: fn(&Tensor, &Tensor) -> f64,
    pub derivative: fn(&Tensor, &Tensor) -> Tensor,
}

impl FnLoss {
    pub fn new(
        value: fn(&Tensor, &Tensor) -> f64,
        derivative: fn(&Tensor, &Tensor) -> Tensor,
    ) -> FnLoss {
        FnLoss { value, derivative }
    }
}

impl fmt::Debug for FnLoss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnLoss")
    }
}

impl LossFn for FnLoss {
    fn value(&self, y_true: &Tensor, y_pred: &Tensor) -> f64 {
        (self.value)(y_true, y_pred)
    }

    fn derivative(&self, y_true: &Tensor, y_pred: &Tensor) -> Tensor {
        (self.derivative)(y_true, y_pred)
    }
}

/// Element count as a float divisor; never zero.
fn count(t: &Tensor) -> f64 {
    t.len().max(1) as f64
}
