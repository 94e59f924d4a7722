use serde::{Serialize, Deserialize};
use std::f64::consts::PI;
use std::fmt::Debug;

use crate::math::tensor::Tensor;

/// A function that can sit in an `Activation` layer: it must expose both its
/// value and its derivative, each evaluated at the layer input.
///
/// Both methods return a tensor with the same shape as `x`.
pub trait Differentiable: Debug + Send + Sync {
    fn value(&self, x: &Tensor) -> Tensor;
    fn derivative(&self, x: &Tensor) -> Tensor;

    fn name(&self) -> &str {
        "Custom"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    Sigmoid,
    ReLU,
    Identity,
    Tanh,
    LeakyReLU { alpha: f64 },
    Elu { alpha: f64 },
    Gelu,
    Swish,
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl ActivationFunction {
    /// Scalar activation.
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => sigmoid(x),
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Identity => x,
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { x } else { alpha * x },
            ActivationFunction::Elu { alpha } => {
                if x > 0.0 { x } else { alpha * (x.exp() - 1.0) }
            }
            ActivationFunction::Gelu => {
                let c = (2.0_f64 / PI).sqrt();
                0.5 * x * (1.0 + (c * (x + 0.044715 * x.powi(3))).tanh())
            }
            ActivationFunction::Swish => x * sigmoid(x),
        }
    }

    /// Scalar derivative, evaluated at the pre-activation input `x`.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => {
                let fx = sigmoid(x);
                fx * (1.0 - fx)
            },
            ActivationFunction::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::Identity => 1.0,
            ActivationFunction::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { 1.0 } else { *alpha },
            ActivationFunction::Elu { alpha } => {
                if x > 0.0 { 1.0 } else { alpha * x.exp() }
            }
            ActivationFunction::Gelu => {
                let c = (2.0_f64 / PI).sqrt();
                let inner = c * (x + 0.044715 * x.powi(3));
                let tanh_inner = inner.tanh();
                let sech2 = 1.0 - tanh_inner * tanh_inner;
                let d_inner = c * (1.0 + 3.0 * 0.044715 * x.powi(2));
                0.5 * tanh_inner + 0.5 * x * sech2 * d_inner + 0.5
            }
            ActivationFunction::Swish => {
                let sig = sigmoid(x);
                sig + x * sig * (1.0 - sig)
            }
        }
    }
}

impl Differentiable for ActivationFunction {
    fn value(&self, x: &Tensor) -> Tensor {
        x.mapv(|v| self.function(v))
    }

    fn derivative(&self, x: &Tensor) -> Tensor {
        x.mapv(|v| ActivationFunction::derivative(self, v))
    }

    fn name(&self) -> &str {
        match self {
            ActivationFunction::Sigmoid => "Sigmoid",
            ActivationFunction::ReLU => "ReLU",
            ActivationFunction::Identity => "Identity",
            ActivationFunction::Tanh => "Tanh",
            ActivationFunction::LeakyReLU { .. } => "LeakyReLU",
            ActivationFunction::Elu { .. } => "Elu",
            ActivationFunction::Gelu => "Gelu",
            ActivationFunction::Swish => "Swish",
        }
    }
}
