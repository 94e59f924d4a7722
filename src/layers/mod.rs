pub mod activation;
pub mod conv2d;
pub mod dense;
pub mod flatten;
pub mod pooling;

use crate::{math::tensor::Tensor, Result};

/// Uniform forward/backward contract shared by every layer.
///
/// `forward` caches whatever `backward` needs; `backward` consumes that cache,
/// updates the layer's parameters (if it has any) with plain gradient descent
/// and returns the gradient with respect to the layer's input. The gradient
/// passed to `backward` must have the shape `forward` returned.
pub trait Layer: std::fmt::Debug {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor>;
    fn backward(&mut self, output_gradient: &Tensor, learning_rate: f64) -> Result<Tensor>;
    fn name(&self) -> &str;

    /// Number of learnable scalars.
    fn param_count(&self) -> usize {
        0
    }
}

pub use activation::Activation;
pub use conv2d::Conv2D;
pub use dense::Dense;
pub use flatten::Flatten;
pub use pooling::{PoolMode, Pooling2D};

/// The closed set of layers a `Network` can hold.
#[derive(Debug)]
pub enum LayerKind {
    Dense(Dense),
    Activation(Activation),
    Flatten(Flatten),
    Conv2D(Conv2D),
    Pooling2D(Pooling2D),
}

impl LayerKind {
    fn inner(&self) -> &dyn Layer {
        match self {
            LayerKind::Dense(l) => l,
            LayerKind::Activation(l) => l,
            LayerKind::Flatten(l) => l,
            LayerKind::Conv2D(l) => l,
            LayerKind::Pooling2D(l) => l,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Layer {
        match self {
            LayerKind::Dense(l) => l,
            LayerKind::Activation(l) => l,
            LayerKind::Flatten(l) => l,
            LayerKind::Conv2D(l) => l,
            LayerKind::Pooling2D(l) => l,
        }
    }
}

impl Layer for LayerKind {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        self.inner_mut().forward(input)
    }

    fn backward(&mut self, output_gradient: &Tensor, learning_rate: f64) -> Result<Tensor> {
        self.inner_mut().backward(output_gradient, learning_rate)
    }

    fn name(&self) -> &str {
        self.inner().name()
    }

    fn param_count(&self) -> usize {
        self.inner().param_count()
    }
}

impl From<Dense> for LayerKind {
    fn from(layer: Dense) -> Self {
        LayerKind::Dense(layer)
    }
}

impl From<Activation> for LayerKind {
    fn from(layer: Activation) -> Self {
        LayerKind::Activation(layer)
    }
}

impl From<Flatten> for LayerKind {
    fn from(layer: Flatten) -> Self {
        LayerKind::Flatten(layer)
    }
}

impl From<Conv2D> for LayerKind {
    fn from(layer: Conv2D) -> Self {
        LayerKind::Conv2D(layer)
    }
}

impl From<Pooling2D> for LayerKind {
    fn from(layer: Pooling2D) -> Self {
        LayerKind::Pooling2D(layer)
    }
}
