use cinder_nn::{Activation, ActivationFunction, Dataset, Dense, Network, TrainConfig};
use ndarray::array;

fn main() -> cinder_nn::Result<()> {
    let data = Dataset::new(
        array![[1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]].into_dyn(),
        array![[1.0], [0.0], [1.0], [0.0]].into_dyn(),
    )?;

    let mut network = Network::new(TrainConfig::new(10000, 0.1).verbose(false));
    network.add(Dense::new(2, 3))?;
    network.add(Activation::new(ActivationFunction::Sigmoid))?;
    network.add(Dense::new(3, 1))?;
    println!("{}", network.summary());

    network.fit(&data)?;
    println!();

    for (epoch, loss) in network.history().iter().enumerate().step_by(1000) {
        println!("Epoch {epoch}: loss = {loss:.6}");
    }

    let output = network.predict(data.x())?;
    for (input, out) in data.x().outer_iter().zip(output.iter()) {
        println!("Input: {} -> Output: {:.4}", input, out);
    }
    Ok(())
}
