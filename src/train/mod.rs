pub mod epoch_stats;
pub mod loop_fn;
pub mod reporter;
pub mod train_config;

pub use epoch_stats::EpochStats;
pub use loop_fn::train_loop;
pub use reporter::{ChannelReporter, ConsoleReporter, ProgressReporter, SilentReporter};
pub use train_config::{BatchLossPolicy, TrainConfig};
