use std::io::Write;
use std::sync::mpsc;

use log::debug;

use crate::train::epoch_stats::EpochStats;

/// Receives one `EpochStats` per completed epoch. Reporting is purely
/// observational and cannot influence training.
pub trait ProgressReporter {
    fn report(&mut self, stats: &EpochStats);
}

/// Prints `epoch i/n, error = …` to stdout.
///
/// With `verbose` every epoch gets its own line; otherwise the line is
/// rewritten in place with a carriage return.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter {
    pub verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        ConsoleReporter { verbose }
    }
}

impl ProgressReporter for ConsoleReporter {
    fn report(&mut self, stats: &EpochStats) {
        let line = format!("epoch {}/{}, error = {}", stats.epoch, stats.total_epochs, stats.loss);
        if self.verbose {
            println!("{line}");
        } else {
            let mut out = std::io::stdout().lock();
            // Progress output is best effort.
            let _ = write!(out, "{line}\r");
            let _ = out.flush();
        }
    }
}

/// Discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn report(&mut self, _stats: &EpochStats) {}
}

/// Forwards every report over a channel, e.g. to a UI thread.
///
/// A dropped receiver is ignored; training carries on.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: mpsc::Sender<EpochStats>,
}

impl ChannelReporter {
    pub fn new(tx: mpsc::Sender<EpochStats>) -> Self {
        ChannelReporter { tx }
    }
}

impl ProgressReporter for ChannelReporter {
    fn report(&mut self, stats: &EpochStats) {
        if self.tx.send(stats.clone()).is_err() {
            debug!("progress receiver dropped at epoch {}", stats.epoch);
        }
    }
}
