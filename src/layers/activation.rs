use crate::{
    activation::{ActivationFunction, Differentiable},
    error::NnError,
    math::tensor::{self, Tensor},
    Result,
};

/// Applies a differentiable function element-wise; no parameters.
#[derive(Debug)]
pub struct Activation {
    function: Box<dyn Differentiable>,
    input: Option<Tensor>,
}

impl Activation {
    pub fn new(function: ActivationFunction) -> Activation {
        Activation::custom(function)
    }

    /// Wraps any value/derivative pair.
    pub fn custom<F: Differentiable + 'static>(function: F) -> Activation {
        Activation { function: Box::new(function), input: None }
    }

    pub fn function(&self) -> &dyn Differentiable {
        self.function.as_ref()
    }
}

impl From<ActivationFunction> for Activation {
    fn from(function: ActivationFunction) -> Self {
        Activation::new(function)
    }
}

impl super::Layer for Activation {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        let output = self.function.value(input);
        self.input = Some(input.clone());
        Ok(output)
    }

    fn backward(&mut self, output_gradient: &Tensor, _learning_rate: f64) -> Result<Tensor> {
        let cached = self.input.as_ref().ok_or(NnError::MissingForwardCache("Activation"))?;
        tensor::check_shape(cached.shape(), output_gradient.shape())?;
        let input = self.input.take().ok_or(NnError::MissingForwardCache("Activation"))?;
        // Chain rule for an element-wise map.
        Ok(self.function.derivative(&input) * output_gradient)
    }

    fn name(&self) -> &str {
        self.function.name()
    }
}
