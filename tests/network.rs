use approx::assert_abs_diff_eq;
use ndarray::{array, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;

use cinder_nn::activation::ActivationFunction;
use cinder_nn::data::Dataset;
use cinder_nn::layers::{Activation, Conv2D, Dense, Flatten, LayerKind, Pooling2D};
use cinder_nn::loss::{LossFn, LossType};
use cinder_nn::math::im2col::Padding;
use cinder_nn::math::tensor::{self, Tensor};
use cinder_nn::network::Network;
use cinder_nn::train::{BatchLossPolicy, ChannelReporter, SilentReporter, TrainConfig};
use cinder_nn::NnError;

fn xor() -> Dataset {
    Dataset::new(
        array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]].into_dyn(),
        array![[0.0], [1.0], [1.0], [0.0]].into_dyn(),
    )
    .unwrap()
}

fn xor_network(config: TrainConfig) -> Network {
    let mut nn = Network::new(config);
    nn.set_reporter(SilentReporter);
    nn.add(
        Dense::from_params(
            array![[0.5, -0.4, 0.3], [-0.3, 0.45, 0.2]],
            Array2::zeros((1, 3)),
        )
        .unwrap(),
    )
    .unwrap();
    nn.add(Activation::new(ActivationFunction::Sigmoid)).unwrap();
    nn.add(Dense::from_params(array![[0.4], [-0.35], [0.25]], Array2::zeros((1, 1))).unwrap())
        .unwrap();
    nn
}

fn dense_weights(nn: &Network, index: usize) -> Array2<f64> {
    match &nn.layers()[index] {
        LayerKind::Dense(dense) => dense.weights().clone(),
        other => panic!("layer {index} is {other:?}"),
    }
}

#[test]
fn predict_and_cost_require_fit() {
    let configs: Vec<Box<dyn Fn(&mut Network)>> = vec![
        Box::new(|nn: &mut Network| {
            nn.add(Dense::new(2, 1)).unwrap();
        }),
        Box::new(|nn: &mut Network| {
            nn.add(Conv2D::new((4, 4, 1), (3, 3), 1, 1, Padding::Valid).unwrap()).unwrap();
            nn.add(Flatten::new()).unwrap();
        }),
        Box::new(|nn: &mut Network| {
            nn.add(Pooling2D::max(2, 2)).unwrap();
        }),
    ];
    for build in configs {
        let mut nn = Network::new(TrainConfig::new(1, 0.1).verbose(false));
        build(&mut nn);
        let x = Tensor::zeros(vec![1, 4, 4, 1]);
        assert!(matches!(nn.predict(&x), Err(NnError::NotFitted)));
        assert!(matches!(nn.cost(None, None), Err(NnError::NotFitted)));
        assert!(matches!(nn.cost(Some(&x), Some(&x)), Err(NnError::NotFitted)));
    }
}

#[test]
fn xor_converges() {
    let mut nn = xor_network(TrainConfig::new(8000, 0.1).verbose(false));
    let data = xor();
    nn.fit(&data).unwrap();

    let history = nn.history().to_vec();
    assert_eq!(history.len(), 8000);

    let window = 100;
    let means: Vec<f64> = history
        .chunks(window)
        .map(|w| w.iter().sum::<f64>() / w.len() as f64)
        .collect();
    for pair in means.windows(2) {
        assert!(pair[1] <= pair[0] + 1e-9, "window mean rose: {} -> {}", pair[0], pair[1]);
    }
    assert!(history[7999] < 1e-3, "final loss {}", history[7999]);

    let predictions = nn.predict(data.x()).unwrap();
    for (p, y) in predictions.iter().zip(data.y().iter()) {
        assert!((p - y).abs() < 0.1, "prediction {p} for target {y}");
    }
    assert_abs_diff_eq!(nn.cost(None, None).unwrap(), history[7999], epsilon = 1e-3);
}

#[test]
fn fit_batch_rejects_bad_sizes_untouched() {
    let mut nn = xor_network(TrainConfig::new(5, 0.1).verbose(false));
    let before = dense_weights(&nn, 0);

    for size in [0, 5] {
        let err = nn.fit_batch(&xor(), size).unwrap_err();
        assert!(matches!(err, NnError::InvalidConfig(_)));
    }
    assert!(!nn.is_fitted());
    assert!(nn.history().is_empty());
    assert_eq!(dense_weights(&nn, 0), before);

    nn.fit_batch(&xor(), 2).unwrap();
    let history = nn.history().to_vec();
    assert_eq!(history.len(), 5);

    let trained = dense_weights(&nn, 0);
    assert!(nn.fit_batch(&xor(), 9).is_err());
    assert_eq!(nn.history(), history.as_slice());
    assert_eq!(dense_weights(&nn, 0), trained);
}

#[test]
fn target_shape_mismatch_touches_nothing() {
    let mut nn = xor_network(TrainConfig::new(3, 0.1).verbose(false));
    let before = dense_weights(&nn, 2);
    let bad = Dataset::new(xor().x().clone(), Tensor::zeros(vec![4, 2])).unwrap();

    assert!(matches!(nn.fit(&bad), Err(NnError::ShapeMismatch { .. })));
    assert_eq!(dense_weights(&nn, 2), before);
    assert!(!nn.is_fitted());
}

#[test]
fn batch_loss_policies() {
    // A zero learning rate keeps parameters fixed, so each chunk loss can be
    // recomputed afterwards with `cost`.
    let data = xor();
    let run = |policy: BatchLossPolicy| {
        let mut nn = xor_network(TrainConfig::new(1, 0.0).verbose(false).batch_loss(policy));
        nn.fit_batch(&data, 3).unwrap();
        let (x0, y0) = data.rows(0..3);
        let (x1, y1) = data.rows(3..4);
        let first = nn.cost(Some(&x0), Some(&y0)).unwrap();
        let last = nn.cost(Some(&x1), Some(&y1)).unwrap();
        (nn.history()[0], first, last)
    };

    let (mean, first, last) = run(BatchLossPolicy::MeanOfBatches);
    assert_abs_diff_eq!(mean, (first + last) / 2.0, epsilon = 1e-12);

    let (weighted, first, last) = run(BatchLossPolicy::WeightedBySamples);
    assert_abs_diff_eq!(weighted, (3.0 * first + last) / 4.0, epsilon = 1e-12);
    assert!((mean - weighted).abs() > 1e-6);
}

#[test]
fn progress_reaches_channel() {
    let (tx, rx) = std::sync::mpsc::channel();
    let mut nn = xor_network(TrainConfig::new(4, 0.1));
    nn.set_reporter(ChannelReporter::new(tx));
    nn.fit_batch(&xor(), 3).unwrap();

    let stats: Vec<_> = rx.try_iter().collect();
    assert_eq!(stats.len(), 4);
    assert_eq!(stats[0].epoch, 1);
    assert_eq!(stats[3].total_epochs, 4);
    assert!(stats.iter().all(|s| s.batches == 2));
    assert_eq!(stats[3].loss, nn.history()[3]);
}

#[test]
fn conv_pipeline_trains() {
    let mut rng = StdRng::seed_from_u64(7);
    let x = tensor::uniform(vec![6, 6, 6, 1], 0.0, 1.0, &mut rng);
    let labels: Vec<usize> = (0..6).map(|i| i % 2).collect();
    let y = cinder_nn::data::to_categorical(&labels, None).unwrap();
    let data = Dataset::new(x, y).unwrap();

    let mut nn = Network::new(TrainConfig::new(20, 0.05).verbose(false));
    nn.set_reporter(SilentReporter);
    nn.use_loss(LossType::Mse);
    nn.add(Conv2D::with_rng((6, 6, 1), (3, 3), 2, 1, Padding::Same, &mut rng).unwrap())
        .unwrap();
    nn.add(Activation::new(ActivationFunction::ReLU)).unwrap();
    nn.add(Pooling2D::max(2, 2)).unwrap();
    nn.add(Flatten::new()).unwrap();
    nn.add(Dense::with_rng(3 * 3 * 2, 2, &mut rng)).unwrap();
    nn.add(Activation::new(ActivationFunction::Sigmoid)).unwrap();

    nn.fit_batch(&data, 4).unwrap();
    assert_eq!(nn.history().len(), 20);
    assert!(nn.history().iter().all(|l| l.is_finite()));

    let out = nn.predict(data.x()).unwrap();
    assert_eq!(out.shape(), &[6, 2]);
    assert_abs_diff_eq!(
        nn.cost(None, None).unwrap(),
        LossType::Mse.value(data.y(), &out),
        epsilon = 1e-12
    );
}

#[test]
fn max_pool_routes_to_max_cells() {
    use cinder_nn::layers::Layer;

    let x = Tensor::from_shape_vec(
        vec![1, 4, 4, 1],
        vec![
            1.0, 9.0, 2.0, 0.0, //
            3.0, 4.0, 5.0, 8.0, //
            7.0, 0.5, 1.5, 2.5, //
            6.0, 2.0, 3.5, 0.0,
        ],
    )
    .unwrap();
    let mut pool = Pooling2D::max(2, 2);
    let out = pool.forward(&x).unwrap();
    assert_eq!(out.iter().copied().collect::<Vec<_>>(), vec![9.0, 8.0, 7.0, 3.5]);

    let grad = pool.backward(&Tensor::ones(vec![1, 2, 2, 1]), 0.1).unwrap();
    let mut expected = Tensor::zeros(vec![1, 4, 4, 1]);
    for (y, x) in [(0, 1), (1, 3), (2, 0), (3, 2)] {
        expected[[0, y, x, 0]] = 1.0;
    }
    assert_eq!(grad, expected);
}

#[test]
fn set_weights_wrong_shape_keeps_parameters() {
    let mut dense = Dense::with_rng(3, 2, &mut StdRng::seed_from_u64(9));
    let before = dense.weights().clone();
    let err = dense.set_weights(Array2::zeros((2, 3)), Array2::zeros((1, 2))).unwrap_err();
    assert!(matches!(err, NnError::ShapeMismatch { .. }));
    assert_eq!(dense.weights(), &before);

    let mut conv =
        Conv2D::with_rng((4, 4, 1), (2, 2), 2, 2, Padding::Valid, &mut StdRng::seed_from_u64(10))
            .unwrap();
    let kernel = conv.weights().clone();
    assert!(conv
        .set_weights(ndarray::Array4::zeros((2, 2, 1, 2)), Array2::zeros((1, 2)))
        .is_err());
    assert_eq!(conv.weights(), &kernel);
}
