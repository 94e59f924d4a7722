use std::time::Instant;

use log::{debug, trace, warn};

use crate::data::Dataset;
use crate::layers::{Layer, LayerKind};
use crate::loss::LossFn;
use crate::math::tensor::{self, Tensor};
use crate::train::epoch_stats::EpochStats;
use crate::train::reporter::ProgressReporter;
use crate::train::train_config::TrainConfig;
use crate::Result;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `layers` for `config.epochs` epochs and returns the per-epoch loss
/// history.
///
/// # Arguments
/// - `layers`     — the layer chain; parameters are updated in place
/// - `loss`       — loss value/derivative pair evaluated at the chain output
/// - `dataset`    — training samples
/// - `batch_size` — `None` for full-batch training, `Some(n)` for contiguous
///                  chunks of `n` rows (the last one may be shorter)
/// - `config`     — epochs, learning rate and batch-loss policy
/// - `reporter`   — receives one `EpochStats` per completed epoch
///
/// # Errors
/// A batch size of zero or above the sample count is rejected before any
/// computation. A target/output shape mismatch fails the step before its
/// backward sweep, so the failing step updates no parameter.
pub fn train_loop(
    layers: &mut [LayerKind],
    loss: &dyn LossFn,
    dataset: &Dataset,
    batch_size: Option<usize>,
    config: &TrainConfig,
    reporter: &mut dyn ProgressReporter,
) -> Result<Vec<f64>> {
    config.validate()?;
    if let Some(size) = batch_size {
        validate_batch_size(size, dataset.len())?;
    }
    if dataset.is_empty() {
        warn!("training on an empty dataset");
    }

    let mut history = Vec::with_capacity(config.epochs);

    for epoch in 1..=config.epochs {
        let t_start = Instant::now();

        let (epoch_loss, batches) = match batch_size {
            None => {
                let (x, y) = dataset.xy();
                (train_step(layers, loss, x, y, config.learning_rate)?, 1)
            }
            Some(size) => {
                let recorded = run_batches(layers, loss, dataset, size, config.learning_rate)?;
                (config.batch_loss.combine(&recorded), recorded.len())
            }
        };

        if !epoch_loss.is_finite() {
            warn!("epoch {epoch}: loss is {epoch_loss}");
        }
        history.push(epoch_loss);

        reporter.report(&EpochStats {
            epoch,
            total_epochs: config.epochs,
            loss: epoch_loss,
            batches,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        });
    }

    debug!(
        "trained {} epochs, final loss {:?}",
        config.epochs,
        history.last()
    );
    Ok(history)
}

/// Rejects batch sizes that cannot partition `samples` rows.
pub fn validate_batch_size(batch_size: usize, samples: usize) -> Result<()> {
    if batch_size == 0 || batch_size > samples {
        return Err(crate::error::NnError::InvalidConfig(format!(
            "batch size must be within 1..={samples}, got {batch_size}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Sweeps
// ---------------------------------------------------------------------------

/// Runs `input` through every layer in insertion order.
pub fn forward_sweep(layers: &mut [LayerKind], input: &Tensor) -> Result<Tensor> {
    let mut output = input.clone();
    for layer in layers.iter_mut() {
        output = layer.forward(&output)?;
    }
    Ok(output)
}

/// Threads `gradient` through every layer in reverse order; each layer
/// updates its own parameters on the way.
pub fn backward_sweep(
    layers: &mut [LayerKind],
    gradient: Tensor,
    learning_rate: f64,
) -> Result<Tensor> {
    let mut gradient = gradient;
    for layer in layers.iter_mut().rev() {
        gradient = layer.backward(&gradient, learning_rate)?;
    }
    Ok(gradient)
}

/// One forward/backward sweep over `(x, y)`. Returns the loss of the
/// prediction made before the update.
///
/// The target shape is checked before any layer is updated.
pub fn train_step(
    layers: &mut [LayerKind],
    loss: &dyn LossFn,
    x: &Tensor,
    y: &Tensor,
    learning_rate: f64,
) -> Result<f64> {
    let output = forward_sweep(layers, x)?;
    tensor::check_shape(output.shape(), y.shape())?;

    let error = loss.derivative(y, &output);
    backward_sweep(layers, error, learning_rate)?;

    Ok(loss.value(y, &output))
}

/// Contiguous `batch_size` row ranges covering `0..samples`; the last one
/// may be shorter.
pub fn batch_ranges(samples: usize, batch_size: usize) -> Vec<std::ops::Range<usize>> {
    (0..samples)
        .step_by(batch_size.max(1))
        .map(|start| start..(start + batch_size).min(samples))
        .collect()
}

/// One epoch of mini-batch training. Returns `(loss, samples)` per chunk.
pub fn run_batches(
    layers: &mut [LayerKind],
    loss: &dyn LossFn,
    dataset: &Dataset,
    batch_size: usize,
    learning_rate: f64,
) -> Result<Vec<(f64, usize)>> {
    let mut recorded = Vec::new();
    for (index, rows) in batch_ranges(dataset.len(), batch_size).into_iter().enumerate() {
        let samples = rows.len();
        let (x, y) = dataset.rows(rows);
        let batch_loss = train_step(layers, loss, &x, &y, learning_rate)?;
        trace!("batch {index}: {samples} samples, loss {batch_loss}");
        recorded.push((batch_loss, samples));
    }
    Ok(recorded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_size_bounds() {
        assert!(validate_batch_size(0, 4).is_err());
        assert!(validate_batch_size(5, 4).is_err());
        assert!(validate_batch_size(4, 4).is_ok());
        assert!(validate_batch_size(1, 4).is_ok());
    }

    #[test]
    fn batch_ranges_cover_samples() {
        assert_eq!(batch_ranges(10, 4), vec![0..4, 4..8, 8..10]);
        assert_eq!(batch_ranges(8, 4), vec![0..4, 4..8]);
        assert_eq!(batch_ranges(3, 3), vec![0..3]);
    }
}
