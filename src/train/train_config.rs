use serde::{Serialize, Deserialize};

use crate::{error::NnError, Result};

/// How `fit_batch` turns per-chunk losses into one epoch loss.
///
/// The two differ only when the last chunk is smaller than the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchLossPolicy {
    /// Plain mean of the chunk losses; a partial last chunk counts once.
    #[default]
    MeanOfBatches,
    /// Chunk losses weighted by the number of samples in each chunk.
    WeightedBySamples,
}

impl BatchLossPolicy {
    /// Combines `(loss, samples)` pairs recorded for one epoch.
    pub fn combine(self, batches: &[(f64, usize)]) -> f64 {
        if batches.is_empty() {
            return 0.0;
        }
        match self {
            BatchLossPolicy::MeanOfBatches => {
                batches.iter().map(|(loss, _)| loss).sum::<f64>() / batches.len() as f64
            }
            BatchLossPolicy::WeightedBySamples => {
                let samples: usize = batches.iter().map(|(_, n)| n).sum();
                batches.iter().map(|(loss, n)| loss * *n as f64).sum::<f64>()
                    / samples.max(1) as f64
            }
        }
    }
}

/// Hyper-parameters for `Network::fit` / `Network::fit_batch`.
///
/// # Fields
/// - `epochs`        — number of passes over the training data
/// - `learning_rate` — step size handed to every layer's `backward`
/// - `verbose`       — default console progress: one line per epoch when
///                     `true`, a single overwritten line when `false`
/// - `batch_loss`    — epoch-loss policy for mini-batch training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub verbose: bool,
    pub batch_loss: BatchLossPolicy,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            epochs: 1000,
            learning_rate: 0.1,
            verbose: true,
            batch_loss: BatchLossPolicy::default(),
        }
    }
}

impl TrainConfig {
    pub fn new(epochs: usize, learning_rate: f64) -> Self {
        TrainConfig {
            epochs,
            learning_rate,
            ..TrainConfig::default()
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn batch_loss(mut self, policy: BatchLossPolicy) -> Self {
        self.batch_loss = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.learning_rate.is_finite() || self.learning_rate < 0.0 {
            return Err(NnError::InvalidConfig(format!(
                "learning rate must be finite and non-negative, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }

    /// Serializes the config to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Reads a config from JSON; missing fields take their defaults.
    pub fn load_json(path: &str) -> Result<TrainConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config: TrainConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }
}
