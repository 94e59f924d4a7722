use log::debug;
use ndarray::{Array2, Array4, Axis};
use rand::Rng;

use crate::{
    error::NnError,
    math::im2col::{col2im, im2col, Padding, PatchGeometry},
    math::tensor::{self, Tensor},
    optim::sgd::Sgd,
    Result,
};

#[derive(Debug, Clone)]
struct ConvCache {
    input_dim: (usize, usize, usize, usize),
    cols: Array2<f64>,
}

/// 2D convolution over `(batch, height, width, channels)` inputs, computed as
/// one matrix product against the input's receptive-field columns.
#[derive(Debug, Clone)]
pub struct Conv2D {
    input_shape: (usize, usize, usize),
    output_hw: (usize, usize),
    geometry: PatchGeometry,
    weights: Array4<f64>, // (kernel_h, kernel_w, in_channels, filters)
    bias: Array2<f64>,    // (filters, 1)
    cache: Option<ConvCache>,
}

impl Conv2D {
    /// `input_shape` is `(height, width, channels)` of one sample.
    ///
    /// Fails when the padded input, kernel and stride do not give a whole
    /// number of output positions on both axes.
    pub fn new(
        input_shape: (usize, usize, usize),
        kernel_shape: (usize, usize),
        filters: usize,
        stride: usize,
        padding: Padding,
    ) -> Result<Conv2D> {
        Conv2D::with_rng(
            input_shape,
            kernel_shape,
            filters,
            stride,
            padding,
            &mut rand::thread_rng(),
        )
    }

    pub fn with_rng<R: Rng + ?Sized>(
        input_shape: (usize, usize, usize),
        kernel_shape: (usize, usize),
        filters: usize,
        stride: usize,
        padding: Padding,
        rng: &mut R,
    ) -> Result<Conv2D> {
        let (height, width, in_channels) = input_shape;
        if filters == 0 || in_channels == 0 {
            return Err(NnError::InvalidConfig(format!(
                "Conv2D needs at least one input channel and one filter, got {in_channels} and {filters}"
            )));
        }

        let geometry = PatchGeometry {
            kernel: kernel_shape,
            stride,
            padding: padding.resolve((height, width), kernel_shape, stride),
        };
        let output_hw = geometry.output_dims((height, width))?;
        debug!(
            "Conv2D {:?} -> {:?}x{} (kernel {:?}, stride {}, padding {:?})",
            input_shape, output_hw, filters, kernel_shape, stride, geometry.padding
        );

        let weights = tensor::uniform(
            (kernel_shape.0, kernel_shape.1, in_channels, filters),
            -0.5,
            0.5,
            rng,
        );

        Ok(Conv2D {
            input_shape,
            output_hw,
            geometry,
            weights,
            bias: Array2::zeros((filters, 1)),
            cache: None,
        })
    }

    pub fn filters(&self) -> usize {
        self.weights.dim().3
    }

    pub fn geometry(&self) -> &PatchGeometry {
        &self.geometry
    }

    /// `(height, width, filters)` of one output sample.
    pub fn output_shape(&self) -> (usize, usize, usize) {
        (self.output_hw.0, self.output_hw.1, self.filters())
    }

    pub fn weights(&self) -> &Array4<f64> {
        &self.weights
    }

    pub fn bias(&self) -> &Array2<f64> {
        &self.bias
    }

    /// Replaces kernel and bias; rejected unless both shapes match exactly.
    pub fn set_weights(&mut self, weights: Array4<f64>, bias: Array2<f64>) -> Result<()> {
        tensor::check_shape(self.weights.shape(), weights.shape())?;
        tensor::check_shape(self.bias.shape(), bias.shape())?;
        self.weights = weights;
        self.bias = bias;
        Ok(())
    }

    /// Kernel as `(kernel_h * kernel_w * in_channels, filters)`, row order
    /// matching the column matrix.
    fn kernel_columns(&self) -> Result<Array2<f64>> {
        let (kh, kw, ic, oc) = self.weights.dim();
        Ok(tensor::standard_layout(self.weights.clone()).into_shape_with_order((kh * kw * ic, oc))?)
    }
}

impl super::Layer for Conv2D {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        let input = tensor::to_4d(input)?;
        let (batch, height, width, channels) = input.dim();
        let (h, w, c) = self.input_shape;
        tensor::check_shape(&[batch, h, w, c], &[batch, height, width, channels])?;

        let (out_h, out_w) = self.output_hw;
        let filters = self.filters();

        let cols = im2col(&input, &self.geometry)?;
        let kernel = self.kernel_columns()?;

        // (filters, batch * out_h * out_w), columns ordered (b, oy, ox).
        let mut output = kernel.t().dot(&cols);
        output += &self.bias;

        let output = tensor::standard_layout(output)
            .into_shape_with_order((filters, batch, out_h, out_w))?
            .permuted_axes([1, 2, 3, 0]);
        let output = tensor::standard_layout(output);

        self.cache = Some(ConvCache {
            input_dim: (batch, height, width, channels),
            cols,
        });
        Ok(output.into_dyn())
    }

    fn backward(&mut self, output_gradient: &Tensor, learning_rate: f64) -> Result<Tensor> {
        let batch = self
            .cache
            .as_ref()
            .ok_or(NnError::MissingForwardCache("Conv2D"))?
            .input_dim
            .0;
        let (out_h, out_w) = self.output_hw;
        let filters = self.filters();

        let grad = tensor::to_4d(output_gradient)?;
        tensor::check_shape(&[batch, out_h, out_w, filters], grad.shape())?;
        let cache = self.cache.take().ok_or(NnError::MissingForwardCache("Conv2D"))?;

        let bias_grad = grad
            .sum_axis(Axis(0))
            .sum_axis(Axis(0))
            .sum_axis(Axis(0))
            .insert_axis(Axis(1));

        // Same column order as the forward product.
        let grad_rows = tensor::standard_layout(grad.permuted_axes([3, 0, 1, 2]))
            .into_shape_with_order((filters, batch * out_h * out_w))?;

        let kernel = self.kernel_columns()?;
        let cols_grad = kernel.dot(&grad_rows);
        let weights_grad = tensor::standard_layout(grad_rows.dot(&cache.cols.t()).reversed_axes())
            .into_shape_with_order(self.weights.raw_dim())?;

        let input_grad = col2im(&cols_grad, cache.input_dim, &self.geometry)?;

        let sgd = Sgd::new(learning_rate);
        sgd.step(&mut self.weights, &weights_grad);
        sgd.step(&mut self.bias, &bias_grad);

        Ok(input_grad.into_dyn())
    }

    fn name(&self) -> &str {
        "Conv2D"
    }

    fn param_count(&self) -> usize {
        self.weights.len() + self.bias.len()
    }
}

#[cfg(test)]
mod tests {
    use super::super::Layer;
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_conv2d_identity_kernel() {
        let mut conv = Conv2D::new((2, 2, 1), (1, 1), 1, 1, Padding::Valid).unwrap();
        conv.set_weights(Array4::ones((1, 1, 1, 1)), Array2::zeros((1, 1))).unwrap();

        let input = Tensor::from_shape_vec(vec![1, 2, 2, 1], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let output = conv.forward(&input).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_conv2d_matches_direct_convolution() {
        let mut conv = Conv2D::new((4, 4, 2), (3, 3), 3, 1, Padding::Explicit(1)).unwrap();
        let input = Tensor::from_shape_fn(vec![2, 4, 4, 2], |ix| {
            ((ix[0] * 31 + ix[1] * 7 + ix[2] * 3 + ix[3]) % 11) as f64 / 11.0 - 0.5
        });
        let output = conv.forward(&input).unwrap();
        assert_eq!(output.shape(), &[2, 4, 4, 3]);

        let w = conv.weights().clone();
        for b in 0..2 {
            for oy in 0..4 {
                for ox in 0..4 {
                    for f in 0..3 {
                        let mut sum = conv.bias()[[f, 0]];
                        for ky in 0..3 {
                            for kx in 0..3 {
                                let (iy, ix) = (oy + ky, ox + kx);
                                if iy < 1 || ix < 1 || iy > 4 || ix > 4 {
                                    continue;
                                }
                                for c in 0..2 {
                                    sum += input[[b, iy - 1, ix - 1, c]] * w[[ky, kx, c, f]];
                                }
                            }
                        }
                        assert_abs_diff_eq!(output[[b, oy, ox, f]], sum, epsilon = 1e-12);
                    }
                }
            }
        }
    }

    #[test]
    fn test_conv2d_rejects_fractional_output() {
        let err = Conv2D::new((6, 6, 1), (3, 3), 2, 2, Padding::Valid).unwrap_err();
        assert!(matches!(err, NnError::InvalidConfig(_)));
        assert!(Conv2D::new((7, 7, 1), (3, 3), 2, 2, Padding::Valid).is_ok());
    }

    #[test]
    fn test_conv2d_rejects_wrong_input() {
        let mut conv = Conv2D::new((5, 5, 1), (3, 3), 2, 1, Padding::Valid).unwrap();
        let err = conv.forward(&Tensor::zeros(vec![1, 5, 5, 2])).unwrap_err();
        assert!(matches!(err, NnError::ShapeMismatch { .. }));
        assert!(conv.forward(&Tensor::zeros(vec![5, 5, 1])).is_err());
    }

    #[test]
    fn test_conv2d_bias_gradient_sums_positions() {
        let mut conv = Conv2D::new((3, 3, 1), (2, 2), 2, 1, Padding::Valid).unwrap();
        conv.forward(&Tensor::zeros(vec![2, 3, 3, 1])).unwrap();
        conv.backward(&Tensor::ones(vec![2, 2, 2, 2]), 0.5).unwrap();
        // 2 samples x 4 positions, each with gradient 1.
        assert_abs_diff_eq!(conv.bias()[[0, 0]], -4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(conv.bias()[[1, 0]], -4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_same_padding_keeps_spatial_size() {
        let conv = Conv2D::new((5, 7, 3), (3, 3), 4, 1, Padding::Same).unwrap();
        assert_eq!(conv.output_shape(), (5, 7, 4));
        assert_eq!(conv.param_count(), 3 * 3 * 3 * 4 + 4);
    }

    #[test]
    fn test_rejected_gradient_keeps_forward_cache() {
        let mut conv = Conv2D::new((3, 3, 1), (2, 2), 1, 1, Padding::Valid).unwrap();
        conv.forward(&Tensor::zeros(vec![1, 3, 3, 1])).unwrap();
        let err = conv.backward(&Tensor::zeros(vec![1, 3, 3, 1]), 0.1).unwrap_err();
        assert!(matches!(err, NnError::ShapeMismatch { .. }));

        let grad = conv.backward(&Tensor::ones(vec![1, 2, 2, 1]), 0.1).unwrap();
        assert_eq!(grad.shape(), &[1, 3, 3, 1]);
    }
}
