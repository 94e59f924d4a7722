use serde::{Serialize, Deserialize};

/// Per-epoch training statistics handed to the `ProgressReporter`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Loss recorded for this epoch.
    pub loss: f64,
    /// Forward/backward sweeps run in this epoch (1 for full-batch training).
    pub batches: usize,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}
