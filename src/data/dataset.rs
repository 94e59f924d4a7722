use std::ops::Range;

use ndarray::{Axis, Slice};

use crate::{
    error::NnError,
    math::tensor::Tensor,
    Result,
};

/// Features and targets sharing a leading sample axis.
///
/// `x` is `(samples, features)` for dense models or
/// `(samples, height, width, channels)` for convolutional ones; `y` is
/// `(samples, outputs)`.
#[derive(Debug, Clone)]
pub struct Dataset {
    x: Tensor,
    y: Tensor,
    x_names: Option<Vec<String>>,
    y_name: Option<String>,
}

impl Dataset {
    pub fn new(x: Tensor, y: Tensor) -> Result<Dataset> {
        let (x_rows, y_rows) = (x.shape().first().copied(), y.shape().first().copied());
        match (x_rows, y_rows) {
            (Some(a), Some(b)) if a == b => Ok(Dataset { x, y, x_names: None, y_name: None }),
            _ => Err(NnError::ShapeMismatch {
                expected: x.shape().iter().take(1).copied().collect(),
                actual: y.shape().iter().take(1).copied().collect(),
            }),
        }
    }

    /// Attaches column names; `x_names` must have one entry per feature column.
    pub fn with_names(mut self, x_names: Vec<String>, y_name: impl Into<String>) -> Result<Dataset> {
        let features = self.x.shape().get(1).copied().unwrap_or(0);
        if self.x.ndim() != 2 || x_names.len() != features {
            return Err(NnError::shape(&[features], &[x_names.len()]));
        }
        self.x_names = Some(x_names);
        self.y_name = Some(y_name.into());
        Ok(self)
    }

    /// Names 2-D feature columns `A, B, …` and the target `Y`.
    pub fn with_generated_names(self) -> Result<Dataset> {
        let features = self.x.shape().get(1).copied().unwrap_or(0);
        self.with_names(super::util::label_gen(features), "Y")
    }

    pub fn x(&self) -> &Tensor {
        &self.x
    }

    pub fn y(&self) -> &Tensor {
        &self.y
    }

    pub fn xy(&self) -> (&Tensor, &Tensor) {
        (&self.x, &self.y)
    }

    pub fn x_names(&self) -> Option<&[String]> {
        self.x_names.as_deref()
    }

    pub fn y_name(&self) -> Option<&str> {
        self.y_name.as_deref()
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.x.shape()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies the contiguous sample range `rows` (clamped to the dataset).
    pub fn rows(&self, rows: Range<usize>) -> (Tensor, Tensor) {
        let end = rows.end.min(self.len());
        let start = rows.start.min(end);
        let slice = Slice::from(start..end);
        (
            self.x.slice_axis(Axis(0), slice).to_owned(),
            self.y.slice_axis(Axis(0), slice).to_owned(),
        )
    }

    /// Copies the samples at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Dataset {
        Dataset {
            x: self.x.select(Axis(0), indices),
            y: self.y.select(Axis(0), indices),
            x_names: self.x_names.clone(),
            y_name: self.y_name.clone(),
        }
    }
}
