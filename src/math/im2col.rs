//! Conversion between padded image batches and receptive-field column matrices.
//!
//! Image batches are laid out as `(batch, height, width, channels)`. A column
//! matrix has one row per receptive-field element and one column per output
//! position:
//!
//! - row `(ky * kernel_w + kx) * channels + c`
//! - column `(b * out_h + oy) * out_w + ox`
//!
//! so a kernel of shape `(kernel_h, kernel_w, channels, filters)` reshaped to
//! `(kernel_h * kernel_w * channels, filters)` lines up row-for-row with the
//! columns produced here.

use ndarray::{s, Array2, Array4};
use serde::{Deserialize, Serialize};

use crate::error::{NnError, Result};

/// How a layer pads its input before extracting receptive fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Padding {
    /// No padding.
    Valid,
    /// Pad so the output extent is `ceil(input / stride)`; any odd remainder
    /// goes to the bottom/right edge.
    Same,
    /// The same amount of zero rows/columns on every side.
    Explicit(usize),
}

impl Default for Padding {
    fn default() -> Self {
        Padding::Valid
    }
}

impl From<usize> for Padding {
    fn from(amount: usize) -> Self {
        if amount == 0 {
            Padding::Valid
        } else {
            Padding::Explicit(amount)
        }
    }
}

/// Resolved zero padding on each edge of the spatial axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Padding2D {
    pub top: usize,
    pub bottom: usize,
    pub left: usize,
    pub right: usize,
}

impl Padding2D {
    pub fn symmetric(amount: usize) -> Self {
        Padding2D { top: amount, bottom: amount, left: amount, right: amount }
    }
}

impl Padding {
    /// Resolves the padding for an input of `(height, width)`.
    pub fn resolve(
        self,
        input: (usize, usize),
        kernel: (usize, usize),
        stride: usize,
    ) -> Padding2D {
        match self {
            Padding::Valid => Padding2D::default(),
            Padding::Explicit(p) => Padding2D::symmetric(p),
            Padding::Same => {
                let (top, bottom) = same_padding(input.0, kernel.0, stride);
                let (left, right) = same_padding(input.1, kernel.1, stride);
                Padding2D { top, bottom, left, right }
            }
        }
    }
}

fn same_padding(input: usize, kernel: usize, stride: usize) -> (usize, usize) {
    let out = (input + stride - 1) / stride;
    let total = ((out.saturating_sub(1)) * stride + kernel).saturating_sub(input);
    let before = total / 2;
    (before, total - before)
}

/// Receptive-field geometry shared by the forward and backward transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchGeometry {
    pub kernel: (usize, usize),
    pub stride: usize,
    pub padding: Padding2D,
}

impl PatchGeometry {
    /// Output `(height, width)` for an unpadded input of `(height, width)`.
    ///
    /// Fails unless `(in + pad - k) / stride` is an exact non-negative integer on
    /// both axes.
    pub fn output_dims(&self, input: (usize, usize)) -> Result<(usize, usize)> {
        let p = self.padding;
        let out_h = output_extent(input.0, p.top + p.bottom, self.kernel.0, self.stride, "height")?;
        let out_w = output_extent(input.1, p.left + p.right, self.kernel.1, self.stride, "width")?;
        Ok((out_h, out_w))
    }
}

/// `(input + padding - kernel) / stride + 1`, rejected when not an exact integer.
pub fn output_extent(
    input: usize,
    padding: usize,
    kernel: usize,
    stride: usize,
    axis: &str,
) -> Result<usize> {
    if kernel == 0 || stride == 0 {
        return Err(NnError::InvalidConfig(format!(
            "kernel ({kernel}) and stride ({stride}) must be positive"
        )));
    }
    let padded = input + padding;
    if padded < kernel {
        return Err(NnError::InvalidConfig(format!(
            "window of {kernel} does not fit a padded {axis} of {padded}"
        )));
    }
    let span = padded - kernel;
    if span % stride != 0 {
        return Err(NnError::InvalidConfig(format!(
            "invalid output {axis}: ({padded} - {kernel}) / {stride} + 1 is not an integer"
        )));
    }
    Ok(span / stride + 1)
}

/// Zero-pads the spatial axes of an image batch.
pub fn pad2d(input: &Array4<f64>, padding: Padding2D) -> Array4<f64> {
    if padding == Padding2D::default() {
        return input.clone();
    }
    let (batch, height, width, channels) = input.dim();
    let mut padded = Array4::zeros((
        batch,
        height + padding.top + padding.bottom,
        width + padding.left + padding.right,
        channels,
    ));
    padded
        .slice_mut(s![
            ..,
            padding.top..padding.top + height,
            padding.left..padding.left + width,
            ..
        ])
        .assign(input);
    padded
}

/// Extracts every receptive field of `input` as one column.
pub fn im2col(input: &Array4<f64>, geometry: &PatchGeometry) -> Result<Array2<f64>> {
    let (batch, height, width, channels) = input.dim();
    let (out_h, out_w) = geometry.output_dims((height, width))?;
    let (kernel_h, kernel_w) = geometry.kernel;
    let stride = geometry.stride;

    let padded = pad2d(input, geometry.padding);
    let mut cols = Array2::zeros((kernel_h * kernel_w * channels, batch * out_h * out_w));

    for b in 0..batch {
        for oy in 0..out_h {
            for ox in 0..out_w {
                let col = (b * out_h + oy) * out_w + ox;
                let (y0, x0) = (oy * stride, ox * stride);
                for ky in 0..kernel_h {
                    for kx in 0..kernel_w {
                        let row = (ky * kernel_w + kx) * channels;
                        for c in 0..channels {
                            cols[[row + c, col]] = padded[[b, y0 + ky, x0 + kx, c]];
                        }
                    }
                }
            }
        }
    }

    Ok(cols)
}

/// Scatters columns back onto an image batch of shape `input_dim`.
///
/// Inverse of [`im2col`] for gradients: values from overlapping receptive
/// fields are summed, and the padding border is discarded.
pub fn col2im(
    cols: &Array2<f64>,
    input_dim: (usize, usize, usize, usize),
    geometry: &PatchGeometry,
) -> Result<Array4<f64>> {
    let (batch, height, width, channels) = input_dim;
    let (out_h, out_w) = geometry.output_dims((height, width))?;
    let (kernel_h, kernel_w) = geometry.kernel;
    let stride = geometry.stride;
    let p = geometry.padding;

    let expected = [kernel_h * kernel_w * channels, batch * out_h * out_w];
    if cols.shape() != expected {
        return Err(NnError::shape(&expected, cols.shape()));
    }

    let mut padded = Array4::zeros((
        batch,
        height + p.top + p.bottom,
        width + p.left + p.right,
        channels,
    ));

    for b in 0..batch {
        for oy in 0..out_h {
            for ox in 0..out_w {
                let col = (b * out_h + oy) * out_w + ox;
                let (y0, x0) = (oy * stride, ox * stride);
                for ky in 0..kernel_h {
                    for kx in 0..kernel_w {
                        let row = (ky * kernel_w + kx) * channels;
                        for c in 0..channels {
                            padded[[b, y0 + ky, x0 + kx, c]] += cols[[row + c, col]];
                        }
                    }
                }
            }
        }
    }

    if p == Padding2D::default() {
        return Ok(padded);
    }
    Ok(padded
        .slice(s![.., p.top..p.top + height, p.left..p.left + width, ..])
        .to_owned())
}
