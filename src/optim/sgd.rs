use ndarray::{ArrayBase, Data, DataMut, Dimension};

/// Plain gradient descent: `param -= learning_rate * grad`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }

    /// Applies one update in place. `grad` must have the shape of `param`.
    pub fn step<S, T, D>(&self, param: &mut ArrayBase<S, D>, grad: &ArrayBase<T, D>)
    where
        S: DataMut<Elem = f64>,
        T: Data<Elem = f64>,
        D: Dimension,
    {
        param.scaled_add(-self.learning_rate, grad);
    }
}
