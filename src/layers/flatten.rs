use crate::{
    error::NnError,
    math::tensor::{self, Tensor},
    Result,
};

/// Collapses every axis after the batch axis into one.
#[derive(Debug, Clone, Default)]
pub struct Flatten {
    input_shape: Option<Vec<usize>>,
}

impl Flatten {
    pub fn new() -> Self {
        Self::default()
    }
}

/// `(batch, product of the remaining axes)`.
fn flattened(shape: &[usize]) -> [usize; 2] {
    [shape[0], shape[1..].iter().product()]
}

impl super::Layer for Flatten {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        let shape = input.shape();
        if shape.is_empty() {
            return Err(NnError::InvalidConfig(
                "Flatten needs a batched tensor, got a scalar".to_string(),
            ));
        }

        let output = tensor::reshape(input, &flattened(shape))?;
        self.input_shape = Some(shape.to_vec());
        Ok(output)
    }

    fn backward(&mut self, output_gradient: &Tensor, _learning_rate: f64) -> Result<Tensor> {
        let cached = self
            .input_shape
            .as_ref()
            .ok_or(NnError::MissingForwardCache("Flatten"))?;
        tensor::check_shape(&flattened(cached), output_gradient.shape())?;

        let shape = self
            .input_shape
            .take()
            .ok_or(NnError::MissingForwardCache("Flatten"))?;
        tensor::reshape(output_gradient, &shape)
    }

    fn name(&self) -> &str {
        "Flatten"
    }
}

#[cfg(test)]
mod tests {
    use super::super::Layer;
    use super::*;

    #[test]
    fn test_flatten_4d_conv_output() {
        let mut layer = Flatten::new();
        let input = Tensor::from_shape_vec(vec![2, 3, 3, 2], (0..36).map(f64::from).collect())
            .unwrap();

        let output = layer.forward(&input).unwrap();
        assert_eq!(output.shape(), &[2, 18]);
        assert_eq!(output[[1, 0]], 18.0);

        let grad = layer.backward(&output, 0.1).unwrap();
        assert_eq!(grad, input);
    }

    #[test]
    fn test_flatten_2d_is_identity() {
        let mut layer = Flatten::new();
        let input = Tensor::from_shape_vec(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(layer.forward(&input).unwrap(), input);
    }

    #[test]
    fn test_backward_rejects_wrong_size() {
        let mut layer = Flatten::new();
        layer.forward(&Tensor::zeros(vec![2, 3, 4])).unwrap();
        assert!(layer.backward(&Tensor::zeros(vec![2, 11]), 0.1).is_err());

        // Same element count, but not the (2, 12) that forward returned.
        let err = layer.backward(&Tensor::zeros(vec![4, 6]), 0.1).unwrap_err();
        assert!(matches!(err, NnError::ShapeMismatch { .. }));

        let grad = layer.backward(&Tensor::ones(vec![2, 12]), 0.1).unwrap();
        assert_eq!(grad.shape(), &[2, 3, 4]);
    }
}
