pub mod dataset;
pub mod util;

pub use dataset::Dataset;
pub use util::{label_gen, minibatch, to_categorical, train_test_split};
