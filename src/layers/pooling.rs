use ndarray::{Array1, Array2, ArrayView1, ArrayViewMut1};
use serde::{Deserialize, Serialize};

use crate::{
    error::NnError,
    math::im2col::{col2im, im2col, Padding2D, PatchGeometry},
    math::tensor::{self, Tensor},
    Result,
};

/// Reduction applied to each pooling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolMode {
    Max,
    Average,
}

impl PoolMode {
    /// Reduces one window to a value; for `Max` also returns the winning row
    /// (first one on ties). A NaN wins its window, so it propagates.
    fn reduce(self, window: ArrayView1<f64>) -> (f64, usize) {
        match self {
            PoolMode::Max => {
                let mut best = (f64::NEG_INFINITY, 0);
                for (row, &value) in window.iter().enumerate() {
                    if value.is_nan() {
                        return (value, row);
                    }
                    if value > best.0 {
                        best = (value, row);
                    }
                }
                best
            }
            PoolMode::Average => (window.mean().unwrap_or(0.0), 0),
        }
    }

    /// Writes the gradient `grad` of one output back into its window.
    fn route(self, mut window: ArrayViewMut1<f64>, grad: f64, selected: usize) {
        match self {
            PoolMode::Max => window[selected] = grad,
            PoolMode::Average => {
                let share = grad / window.len() as f64;
                window.fill(share);
            }
        }
    }
}

#[derive(Debug, Clone)]
struct PoolCache {
    input_dim: (usize, usize, usize, usize),
    output_hw: (usize, usize),
    selected: Vec<usize>,
}

/// Spatial pooling over `(batch, height, width, channels)` inputs. Channels
/// are folded into the batch axis so each one is pooled independently.
#[derive(Debug, Clone)]
pub struct Pooling2D {
    size: usize,
    stride: usize,
    mode: PoolMode,
    cache: Option<PoolCache>,
}

impl Pooling2D {
    pub fn new(size: usize, stride: usize, mode: PoolMode) -> Pooling2D {
        Pooling2D { size, stride, mode, cache: None }
    }

    pub fn max(size: usize, stride: usize) -> Pooling2D {
        Pooling2D::new(size, stride, PoolMode::Max)
    }

    pub fn average(size: usize, stride: usize) -> Pooling2D {
        Pooling2D::new(size, stride, PoolMode::Average)
    }

    pub fn mode(&self) -> PoolMode {
        self.mode
    }

    fn geometry(&self) -> PatchGeometry {
        PatchGeometry {
            kernel: (self.size, self.size),
            stride: self.stride,
            padding: Padding2D::default(),
        }
    }
}

impl super::Layer for Pooling2D {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        let input = tensor::to_4d(input)?;
        let (batch, height, width, channels) = input.dim();
        let geometry = self.geometry();
        let (out_h, out_w) = geometry.output_dims((height, width))?;

        // (batch * channels, height, width, 1)
        let folded = tensor::standard_layout(input.permuted_axes([0, 3, 1, 2]))
            .into_shape_with_order((batch * channels, height, width, 1))?;
        let cols = im2col(&folded, &geometry)?;

        let mut output = Array1::zeros(cols.ncols());
        let mut selected = vec![0; cols.ncols()];
        for (j, window) in cols.columns().into_iter().enumerate() {
            let (value, row) = self.mode.reduce(window);
            output[j] = value;
            selected[j] = row;
        }

        let output = output
            .into_shape_with_order((batch, channels, out_h, out_w))?
            .permuted_axes([0, 2, 3, 1]);

        self.cache = Some(PoolCache {
            input_dim: (batch, height, width, channels),
            output_hw: (out_h, out_w),
            selected,
        });
        Ok(tensor::standard_layout(output).into_dyn())
    }

    fn backward(&mut self, output_gradient: &Tensor, _learning_rate: f64) -> Result<Tensor> {
        let cached = self.cache.as_ref().ok_or(NnError::MissingForwardCache("Pooling2D"))?;
        let (batch, height, width, channels) = cached.input_dim;
        let (out_h, out_w) = cached.output_hw;

        let grad = tensor::to_4d(output_gradient)?;
        tensor::check_shape(&[batch, out_h, out_w, channels], grad.shape())?;
        let cache = self.cache.take().ok_or(NnError::MissingForwardCache("Pooling2D"))?;

        // Back to column order: (batch, channels, out_h, out_w) flattened.
        let grad = tensor::standard_layout(grad.permuted_axes([0, 3, 1, 2]));

        let mut cols = Array2::zeros((self.size * self.size, cache.selected.len()));
        for ((window, &g), &row) in cols
            .columns_mut()
            .into_iter()
            .zip(grad.iter())
            .zip(cache.selected.iter())
        {
            self.mode.route(window, g, row);
        }

        let geometry = self.geometry();
        let input_grad = col2im(&cols, (batch * channels, height, width, 1), &geometry)?
            .into_shape_with_order((batch, channels, height, width))?
            .permuted_axes([0, 2, 3, 1]);

        Ok(tensor::standard_layout(input_grad).into_dyn())
    }

    fn name(&self) -> &str {
        match self.mode {
            PoolMode::Max => "MaxPooling2D",
            PoolMode::Average => "AveragePooling2D",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::Layer;
    use super::*;

    fn block_input() -> Tensor {
        Tensor::from_shape_vec(
            vec![1, 4, 4, 1],
            vec![
                1.0, 2.0, 3.0, 4.0, //
                5.0, 6.0, 7.0, 8.0, //
                9.0, 10.0, 11.0, 12.0, //
                13.0, 14.0, 15.0, 16.0,
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_maxpool_2x2_valid() {
        let mut layer = Pooling2D::max(2, 2);
        let output = layer.forward(&block_input()).unwrap();

        assert_eq!(output.shape(), &[1, 2, 2, 1]);
        assert_eq!(output.iter().copied().collect::<Vec<_>>(), vec![6.0, 8.0, 14.0, 16.0]);
    }

    #[test]
    fn test_avgpool_2x2_valid() {
        let mut layer = Pooling2D::average(2, 2);
        let output = layer.forward(&block_input()).unwrap();
        assert_eq!(output.iter().copied().collect::<Vec<_>>(), vec![3.5, 5.5, 11.5, 13.5]);

        let grad = layer.backward(&Tensor::ones(vec![1, 2, 2, 1]), 0.1).unwrap();
        assert!(grad.iter().all(|&g| g == 0.25));
    }

    #[test]
    fn test_channels_pooled_independently() {
        // Channel 1 is the negation of channel 0, so its maxima sit elsewhere.
        let input = Tensor::from_shape_fn(vec![2, 2, 2, 2], |ix| {
            let v = (ix[0] * 4 + ix[1] * 2 + ix[2]) as f64;
            if ix[3] == 0 { v } else { -v }
        });
        let mut layer = Pooling2D::max(2, 2);
        let output = layer.forward(&input).unwrap();
        assert_eq!(output.shape(), &[2, 1, 1, 2]);
        assert_eq!(output[[0, 0, 0, 0]], 3.0);
        assert_eq!(output[[0, 0, 0, 1]], 0.0);
        assert_eq!(output[[1, 0, 0, 0]], 7.0);
        assert_eq!(output[[1, 0, 0, 1]], -4.0);
    }

    #[test]
    fn test_rejects_non_integer_output() {
        let mut layer = Pooling2D::max(2, 2);
        let err = layer.forward(&Tensor::zeros(vec![1, 5, 5, 1])).unwrap_err();
        assert!(matches!(err, NnError::InvalidConfig(_)));
    }

    #[test]
    fn test_overlapping_windows_accumulate() {
        // Stride 1: the centre pixel wins all four windows.
        let mut input = Tensor::zeros(vec![1, 3, 3, 1]);
        input[[0, 1, 1, 0]] = 5.0;
        let mut layer = Pooling2D::max(2, 1);
        layer.forward(&input).unwrap();

        let grad = layer.backward(&Tensor::ones(vec![1, 2, 2, 1]), 0.1).unwrap();
        assert_eq!(grad[[0, 1, 1, 0]], 4.0);
        assert_eq!(grad.sum(), 4.0);
    }

    #[test]
    fn test_rejected_gradient_keeps_forward_cache() {
        let mut layer = Pooling2D::max(2, 2);
        layer.forward(&block_input()).unwrap();
        let err = layer.backward(&Tensor::ones(vec![1, 4, 4, 1]), 0.1).unwrap_err();
        assert!(matches!(err, NnError::ShapeMismatch { .. }));

        let grad = layer.backward(&Tensor::ones(vec![1, 2, 2, 1]), 0.1).unwrap();
        assert_eq!(grad.sum(), 4.0);
    }

    #[test]
    fn test_max_propagates_nan() {
        let input = Tensor::from_shape_vec(vec![1, 2, 2, 1], vec![1.0, f64::NAN, 3.0, 1.0]).unwrap();
        let mut layer = Pooling2D::max(2, 2);
        let output = layer.forward(&input).unwrap();
        assert!(output[[0, 0, 0, 0]].is_nan());

        // The gradient goes to the NaN cell.
        let grad = layer.backward(&Tensor::ones(vec![1, 1, 1, 1]), 0.1).unwrap();
        assert_eq!(grad[[0, 0, 1, 0]], 1.0);
        assert_eq!(grad.sum(), 1.0);
    }
}
