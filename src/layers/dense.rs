use ndarray::{Array2, Axis};
use rand::Rng;

use crate::{
    error::NnError,
    math::tensor::{self, Tensor},
    optim::sgd::Sgd,
    Result,
};

/// Fully-connected layer: `output = input · weights + bias`.
#[derive(Debug, Clone)]
pub struct Dense {
    weights: Array2<f64>, // (input_size, output_size)
    bias: Array2<f64>,    // (1, output_size)
    input: Option<Array2<f64>>,
}

impl Dense {
    /// Weights uniform in [-0.5, 0.5), zero bias.
    pub fn new(input_size: usize, output_size: usize) -> Dense {
        Dense::with_rng(input_size, output_size, &mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng + ?Sized>(input_size: usize, output_size: usize, rng: &mut R) -> Dense {
        Dense {
            weights: tensor::uniform((input_size, output_size), -0.5, 0.5, rng),
            bias: Array2::zeros((1, output_size)),
            input: None,
        }
    }

    /// Builds a layer around explicit parameters; `bias` must be `(1, weights.ncols())`.
    pub fn from_params(weights: Array2<f64>, bias: Array2<f64>) -> Result<Dense> {
        tensor::check_shape(&[1, weights.ncols()], bias.shape())?;
        Ok(Dense { weights, bias, input: None })
    }

    pub fn input_size(&self) -> usize {
        self.weights.nrows()
    }

    pub fn output_size(&self) -> usize {
        self.weights.ncols()
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    pub fn bias(&self) -> &Array2<f64> {
        &self.bias
    }

    /// Replaces both parameters. Nothing is changed unless both shapes match
    /// the current ones exactly.
    pub fn set_weights(&mut self, weights: Array2<f64>, bias: Array2<f64>) -> Result<()> {
        tensor::check_shape(self.weights.shape(), weights.shape())?;
        tensor::check_shape(self.bias.shape(), bias.shape())?;
        self.weights = weights;
        self.bias = bias;
        Ok(())
    }
}

impl super::Layer for Dense {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        let input = tensor::to_2d(input)?;
        if input.ncols() != self.input_size() {
            return Err(NnError::shape(
                &[input.nrows(), self.input_size()],
                input.shape(),
            ));
        }

        let output = input.dot(&self.weights) + &self.bias;
        self.input = Some(input);
        Ok(output.into_dyn())
    }

    fn backward(&mut self, output_gradient: &Tensor, learning_rate: f64) -> Result<Tensor> {
        let rows = self
            .input
            .as_ref()
            .ok_or(NnError::MissingForwardCache("Dense"))?
            .nrows();
        let grad = tensor::to_2d(output_gradient)?;
        tensor::check_shape(&[rows, self.output_size()], grad.shape())?;
        let input = self.input.take().ok_or(NnError::MissingForwardCache("Dense"))?;

        let weights_grad = input.t().dot(&grad);
        let bias_grad = grad.sum_axis(Axis(0)).insert_axis(Axis(0));
        let input_grad = grad.dot(&self.weights.t());

        let sgd = Sgd::new(learning_rate);
        sgd.step(&mut self.weights, &weights_grad);
        sgd.step(&mut self.bias, &bias_grad);

        Ok(input_grad.into_dyn())
    }

    fn name(&self) -> &str {
        "Dense"
    }

    fn param_count(&self) -> usize {
        self.weights.len() + self.bias.len()
    }
}
