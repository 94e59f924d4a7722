pub mod activation;
pub mod data;
pub mod error;
pub mod layers;
pub mod loss;
pub mod math;
pub mod network;
pub mod optim;
pub mod train;

// Convenience re-exports
pub use activation::{ActivationFunction, Differentiable};
pub use data::Dataset;
pub use error::{NnError, Result};
pub use layers::{Activation, Conv2D, Dense, Flatten, Layer, LayerKind, PoolMode, Pooling2D};
pub use loss::{FnLoss, LossFn, LossType, MseLoss};
pub use math::im2col::Padding;
pub use math::Tensor;
pub use network::{LayerSpec, Network, NetworkSpec};
pub use optim::Sgd;
pub use train::{BatchLossPolicy, ProgressReporter, TrainConfig};
