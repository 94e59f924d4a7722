//! Separates images with a vertical bar from images with a horizontal bar
//! using a small conv -> pool -> dense pipeline.

use cinder_nn::data::{to_categorical, train_test_split};
use cinder_nn::loss::LossType;
use cinder_nn::{
    Activation, ActivationFunction, Conv2D, Dataset, Dense, Flatten, Network, Padding, Pooling2D,
    TrainConfig,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SIDE: usize = 8;

fn bars(samples: usize, rng: &mut StdRng) -> cinder_nn::Result<Dataset> {
    let mut x = cinder_nn::Tensor::zeros(vec![samples, SIDE, SIDE, 1]);
    let mut labels = Vec::with_capacity(samples);
    for i in 0..samples {
        let vertical = i % 2 == 0;
        let at = rng.gen_range(1..SIDE - 1);
        for t in 0..SIDE {
            let (row, col) = if vertical { (t, at) } else { (at, t) };
            x[[i, row, col, 0]] = 1.0;
        }
        for v in x.index_axis_mut(ndarray::Axis(0), i).iter_mut() {
            *v += rng.gen_range(-0.1..0.1);
        }
        labels.push(usize::from(vertical));
    }
    Dataset::new(x, to_categorical(&labels, Some(2))?)
}

fn main() -> cinder_nn::Result<()> {
    let mut rng = StdRng::seed_from_u64(42);
    let data = bars(200, &mut rng)?;
    let (train, test) = train_test_split(&data, 0.8, &mut rng)?;

    let mut network = Network::new(TrainConfig::new(30, 0.05));
    network.use_loss(LossType::Mse);
    network.add(Conv2D::with_rng((SIDE, SIDE, 1), (3, 3), 4, 1, Padding::Same, &mut rng)?)?;
    network.add(Activation::new(ActivationFunction::ReLU))?;
    network.add(Pooling2D::max(2, 2))?;
    network.add(Flatten::new())?;
    network.add(Dense::with_rng(4 * 4 * 4, 2, &mut rng))?;
    network.add(Activation::new(ActivationFunction::Sigmoid))?;
    println!("{}", network.summary());

    network.fit_batch(&train, 16)?;

    let predictions = network.predict(test.x())?;
    let correct = predictions
        .outer_iter()
        .zip(test.y().outer_iter())
        .filter(|(p, y)| (p[0] > p[1]) == (y[0] > y[1]))
        .count();
    println!(
        "test cost = {:.4}, accuracy = {}/{}",
        network.cost(Some(test.x()), Some(test.y()))?,
        correct,
        test.len()
    );
    Ok(())
}
