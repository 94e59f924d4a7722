use ndarray::Array2;
use rand::seq::SliceRandom;
use rand::Rng;

use super::Dataset;
use crate::{error::NnError, math::tensor::Tensor, Result};

/// One-hot encodes integer class labels into `(labels.len(), num_classes)`.
///
/// `num_classes` defaults to `max(label) + 1`.
pub fn to_categorical(labels: &[usize], num_classes: Option<usize>) -> Result<Tensor> {
    let inferred = labels.iter().max().map_or(0, |&m| m + 1);
    let classes = num_classes.unwrap_or(inferred);
    if inferred > classes {
        return Err(NnError::InvalidConfig(format!(
            "label {} does not fit in {classes} classes",
            inferred - 1
        )));
    }

    let mut encoded = Array2::zeros((labels.len(), classes));
    for (row, &label) in labels.iter().enumerate() {
        encoded[[row, label]] = 1.0;
    }
    Ok(encoded.into_dyn())
}

/// Shuffles the samples and splits them into `(train, test)`, with
/// `floor(split * len)` samples in `train`.
pub fn train_test_split<R: Rng + ?Sized>(
    dataset: &Dataset,
    split: f64,
    rng: &mut R,
) -> Result<(Dataset, Dataset)> {
    if !(0.0..=1.0).contains(&split) {
        return Err(NnError::InvalidConfig(format!(
            "split fraction must be within [0, 1], got {split}"
        )));
    }

    let mut indices: Vec<usize> = (0..dataset.len()).collect();
    indices.shuffle(rng);
    let cut = (split * dataset.len() as f64) as usize;
    let (train, test) = indices.split_at(cut);
    Ok((dataset.select(train), dataset.select(test)))
}

/// Column-name alphabet; `Y` is left out because it names the target.
const ALPHA: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXZ";

/// `n` distinct spreadsheet-style column names: `A, B, …, Z, AA, AB, …`.
pub fn label_gen(n: usize) -> Vec<String> {
    let base = ALPHA.len();
    (0..n)
        .map(|i| {
            // Bijective base-25 numbering.
            let mut k = i + 1;
            let mut label = Vec::new();
            while k > 0 {
                k -= 1;
                label.push(ALPHA[k % base]);
                k /= base;
            }
            label.iter().rev().map(|&b| b as char).collect()
        })
        .collect()
}

/// Sample indices of `samples` rows grouped into batches of `batch_size`
/// (the last one may be shorter). With an `rng` the indices are shuffled
/// first; without one they stay in order.
pub fn minibatch<R: Rng + ?Sized>(
    samples: usize,
    batch_size: usize,
    rng: Option<&mut R>,
) -> Result<Vec<Vec<usize>>> {
    if batch_size == 0 {
        return Err(NnError::InvalidConfig("batch size must be positive".to_string()));
    }
    let mut indices: Vec<usize> = (0..samples).collect();
    if let Some(rng) = rng {
        indices.shuffle(rng);
    }
    Ok(indices.chunks(batch_size).map(<[usize]>::to_vec).collect())
}
