use ndarray::{Array, Array2, Array4, ArrayD, Dimension, IxDyn, ShapeBuilder};
use rand::prelude::*;
use std::f64::consts::PI;

use crate::error::{NnError, Result};

/// Batched N-dimensional array; the leading axis is always the sample count.
pub type Tensor = ArrayD<f64>;

/// Returns `array` in row-major layout, copying only when it is not already.
pub fn standard_layout<D: Dimension>(array: Array<f64, D>) -> Array<f64, D> {
    if array.is_standard_layout() {
        array
    } else {
        array.as_standard_layout().into_owned()
    }
}

/// Reshapes `tensor` into `shape`, copying into standard layout first if needed.
pub fn reshape(tensor: &Tensor, shape: &[usize]) -> Result<Tensor> {
    let total: usize = shape.iter().product();
    if total != tensor.len() {
        return Err(NnError::shape(shape, tensor.shape()));
    }
    let owned = tensor.as_standard_layout().into_owned();
    Ok(owned.into_shape_with_order(IxDyn(shape))?)
}

/// Views a tensor as a 2-D batch of feature rows.
pub fn to_2d(tensor: &Tensor) -> Result<Array2<f64>> {
    tensor
        .clone()
        .into_dimensionality()
        .map_err(|_| NnError::InvalidConfig(format!(
            "expected a 2-D (batch, features) tensor, got shape {:?}",
            tensor.shape()
        )))
}

/// Views a tensor as a (batch, height, width, channels) image batch.
pub fn to_4d(tensor: &Tensor) -> Result<Array4<f64>> {
    tensor
        .clone()
        .into_dimensionality()
        .map_err(|_| NnError::InvalidConfig(format!(
            "expected a 4-D (batch, height, width, channels) tensor, got shape {:?}",
            tensor.shape()
        )))
}

/// Rejects `actual` unless it is exactly `expected`.
pub fn check_shape(expected: &[usize], actual: &[usize]) -> Result<()> {
    if expected != actual {
        return Err(NnError::shape(expected, actual));
    }
    Ok(())
}

/// Uniform samples in `[low, high)`.
pub fn uniform<D, R>(shape: D, low: f64, high: f64, rng: &mut R) -> Array<f64, D::Dim>
where
    D: ShapeBuilder,
    D::Dim: Dimension,
    R: Rng + ?Sized,
{
    Array::from_shape_simple_fn(shape, || low + rng.gen::<f64>() * (high - low))
}

/// Samples a single value from N(0, 1) using the Box-Muller transform.
fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // (0, 1] keeps ln() finite.
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = 1.0 - rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// He initialization: N(0, sqrt(2 / fan_in)).
///
/// Suited to layers followed by ReLU, which zeroes half of its inputs on average.
pub fn he<D, R>(shape: D, fan_in: usize, rng: &mut R) -> Array<f64, D::Dim>
where
    D: ShapeBuilder,
    D::Dim: Dimension,
    R: Rng + ?Sized,
{
    let std_dev = (2.0 / fan_in.max(1) as f64).sqrt();
    Array::from_shape_simple_fn(shape, || sample_standard_normal(rng) * std_dev)
}

/// Xavier (Glorot) initialization: N(0, sqrt(1 / fan_in)).
///
/// Suited to Sigmoid/Tanh/Identity layers.
pub fn xavier<D, R>(shape: D, fan_in: usize, rng: &mut R) -> Array<f64, D::Dim>
where
    D: ShapeBuilder,
    D::Dim: Dimension,
    R: Rng + ?Sized,
{
    let std_dev = (1.0 / fan_in.max(1) as f64).sqrt();
    Array::from_shape_simple_fn(shape, || sample_standard_normal(rng) * std_dev)
}
