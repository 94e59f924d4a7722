use std::fmt::Write as _;

use log::debug;

use crate::{
    data::Dataset,
    error::NnError,
    layers::{Layer, LayerKind},
    loss::{LossFn, MseLoss},
    math::tensor::{self, Tensor},
    train::{
        loop_fn::{self, train_loop},
        reporter::{ConsoleReporter, ProgressReporter},
        train_config::TrainConfig,
    },
    Result,
};

/// An ordered chain of layers trained end to end against one loss.
///
/// Layers run forward in insertion order and backward in reverse. Once the
/// network has been fitted the chain is frozen.
pub struct Network {
    layers: Vec<LayerKind>,
    loss: Box<dyn LossFn>,
    config: TrainConfig,
    reporter: Box<dyn ProgressReporter>,
    history: Vec<f64>,
    fitted: bool,
    dataset: Option<Dataset>,
}

impl Network {
    /// Empty network with MSE loss and console progress output.
    pub fn new(config: TrainConfig) -> Network {
        let reporter = ConsoleReporter::new(config.verbose);
        Network {
            layers: Vec::new(),
            loss: Box::new(MseLoss),
            config,
            reporter: Box::new(reporter),
            history: Vec::new(),
            fitted: false,
            dataset: None,
        }
    }

    pub fn use_loss<L: LossFn + 'static>(&mut self, loss: L) {
        self.loss = Box::new(loss);
    }

    pub fn set_reporter<R: ProgressReporter + 'static>(&mut self, reporter: R) {
        self.reporter = Box::new(reporter);
    }

    /// Appends a layer to the end of the chain.
    pub fn add(&mut self, layer: impl Into<LayerKind>) -> Result<&mut Self> {
        if self.fitted {
            return Err(NnError::InvalidConfig(
                "cannot add layers to a fitted network".to_string(),
            ));
        }
        self.layers.push(layer.into());
        Ok(self)
    }

    /// Full-batch training: one forward/backward sweep over the whole dataset
    /// per epoch.
    pub fn fit(&mut self, dataset: &Dataset) -> Result<&[f64]> {
        self.train(dataset, None)
    }

    /// Mini-batch training over contiguous chunks of `batch_size` rows.
    pub fn fit_batch(&mut self, dataset: &Dataset, batch_size: usize) -> Result<&[f64]> {
        loop_fn::validate_batch_size(batch_size, dataset.len())?;
        self.train(dataset, Some(batch_size))
    }

    fn train(&mut self, dataset: &Dataset, batch_size: Option<usize>) -> Result<&[f64]> {
        if self.layers.is_empty() {
            return Err(NnError::InvalidConfig("network has no layers".to_string()));
        }
        debug!(
            "fit: {} samples, {} layers, {} epochs, lr {}, batch size {:?}",
            dataset.len(),
            self.layers.len(),
            self.config.epochs,
            self.config.learning_rate,
            batch_size
        );

        let history = train_loop(
            &mut self.layers,
            self.loss.as_ref(),
            dataset,
            batch_size,
            &self.config,
            self.reporter.as_mut(),
        )?;

        self.history = history;
        self.fitted = true;
        self.dataset = Some(dataset.clone());
        Ok(&self.history)
    }

    /// Runs a forward sweep; parameters are not touched.
    pub fn predict(&mut self, x: &Tensor) -> Result<Tensor> {
        if !self.fitted {
            return Err(NnError::NotFitted);
        }
        loop_fn::forward_sweep(&mut self.layers, x)
    }

    /// Loss of the current parameters on `(x, y)`, or on the dataset of the
    /// last fit when both are `None`.
    pub fn cost(&mut self, x: Option<&Tensor>, y: Option<&Tensor>) -> Result<f64> {
        if !self.fitted {
            return Err(NnError::NotFitted);
        }
        let (x, y) = match (x, y) {
            (Some(x), Some(y)) => (x.clone(), y.clone()),
            (None, None) => match &self.dataset {
                Some(dataset) => (dataset.x().clone(), dataset.y().clone()),
                None => return Err(NnError::NotFitted),
            },
            _ => {
                return Err(NnError::InvalidConfig(
                    "cost needs both x and y, or neither".to_string(),
                ))
            }
        };

        let output = loop_fn::forward_sweep(&mut self.layers, &x)?;
        tensor::check_shape(output.shape(), y.shape())?;
        Ok(self.loss.value(&y, &output))
    }

    /// Per-epoch loss of the most recent `fit`/`fit_batch`.
    pub fn history(&self) -> &[f64] {
        &self.history
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    pub fn layers(&self) -> &[LayerKind] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Layer table with parameter counts.
    pub fn summary(&self) -> String {
        let mut s = String::new();
        let rule = "_".repeat(48);
        let _ = writeln!(s, "{rule}");
        let _ = writeln!(s, "{:<4}{:<28}{:>16}", "#", "Layer (type)", "Params");
        let _ = writeln!(s, "{}", "=".repeat(48));
        let mut total = 0;
        for (i, layer) in self.layers.iter().enumerate() {
            let params = layer.param_count();
            total += params;
            let _ = writeln!(s, "{:<4}{:<28}{:>16}", i, layer.name(), params);
        }
        let _ = writeln!(s, "{}", "=".repeat(48));
        let _ = writeln!(s, "Total layers: {}", self.layers.len());
        let _ = writeln!(s, "Total params: {total}");
        let _ = writeln!(s, "Loss: {:?}", self.loss);
        s
    }
}

impl std::fmt::Debug for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("layers", &self.layers)
            .field("loss", &self.loss)
            .field("config", &self.config)
            .field("fitted", &self.fitted)
            .field("epochs_recorded", &self.history.len())
            .finish()
    }
}
