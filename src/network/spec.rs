use serde::{Serialize, Deserialize};

use crate::activation::ActivationFunction;
use crate::layers::{Activation, Conv2D, Dense, Flatten, Pooling2D};
use crate::loss::loss_type::LossType;
use crate::math::im2col::Padding;
use crate::network::network::Network;
use crate::train::train_config::TrainConfig;
use crate::Result;

/// Describes one layer in a network specification.
///
/// Serialized with a `"type"` tag, e.g.
/// `{"type": "dense", "input_size": 2, "output_size": 3}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSpec {
    Dense {
        input_size: usize,
        output_size: usize,
    },
    Activation {
        function: ActivationFunction,
    },
    Flatten,
    #[serde(rename = "conv2d")]
    Conv2D {
        /// `(height, width, channels)` of one sample.
        input_shape: (usize, usize, usize),
        kernel: (usize, usize),
        filters: usize,
        #[serde(default = "one")]
        stride: usize,
        #[serde(default)]
        padding: Padding,
    },
    #[serde(rename = "max_pooling2d")]
    MaxPooling2D {
        size: usize,
        stride: usize,
    },
    #[serde(rename = "average_pooling2d")]
    AveragePooling2D {
        size: usize,
        stride: usize,
    },
}

fn one() -> usize {
    1
}

/// A serializable description of a network architecture plus its loss and
/// training hyper-parameters. Learned parameters are never part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name.
    pub name: String,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
    #[serde(default)]
    pub loss: LossType,
    #[serde(default)]
    pub train: TrainConfig,
}

impl NetworkSpec {
    /// Constructs a freshly initialised, unfitted network.
    ///
    /// Fails on invalid hyper-parameters or conv/pool geometry.
    pub fn build(&self) -> Result<Network> {
        self.train.validate()?;

        let mut network = Network::new(self.train.clone());
        network.use_loss(self.loss);
        for layer in &self.layers {
            match layer {
                &LayerSpec::Dense { input_size, output_size } => {
                    network.add(Dense::new(input_size, output_size))?
                }
                LayerSpec::Activation { function } => {
                    network.add(Activation::new(function.clone()))?
                }
                LayerSpec::Flatten => network.add(Flatten::new())?,
                &LayerSpec::Conv2D { input_shape, kernel, filters, stride, padding } => {
                    network.add(Conv2D::new(input_shape, kernel, filters, stride, padding)?)?
                }
                &LayerSpec::MaxPooling2D { size, stride } => network.add(Pooling2D::max(size, stride))?,
                &LayerSpec::AveragePooling2D { size, stride } => {
                    network.add(Pooling2D::average(size, stride))?
                }
            };
        }
        Ok(network)
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json(path: &str) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
