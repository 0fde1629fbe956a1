// Dataset combinators — subset, concatenate, in-memory rows, splitting

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::dataset::{Dataset, Sample};
use crate::error::{Error, Result};

// SubsetDataset — view of selected indices

/// A dataset that exposes only the samples at the given indices.
///
/// Useful for train/val/test splitting.
pub struct SubsetDataset<D: Dataset> {
    inner: D,
    indices: Vec<usize>,
}

impl<D: Dataset> SubsetDataset<D> {
    /// Create a subset of `inner` containing only the samples at `indices`.
    ///
    /// # Panics
    /// Panics (lazily, at `get` time) if any index is out of range.
    pub fn new(inner: D, indices: Vec<usize>) -> Self {
        Self { inner, indices }
    }
}

impl<D: Dataset> Dataset for SubsetDataset<D> {
    fn len(&self) -> usize {
        self.indices.len()
    }

    fn get(&self, index: usize) -> Sample {
        self.inner.get(self.indices[index])
    }

    fn feature_dim(&self) -> usize {
        self.inner.feature_dim()
    }

    fn target_dim(&self) -> usize {
        self.inner.target_dim()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

// ConcatDataset — concatenate multiple datasets

/// Concatenate two or more datasets end-to-end.
///
/// All datasets must share feature and target widths.
pub struct ConcatDataset {
    datasets: Vec<Box<dyn Dataset>>,
    cumulative_sizes: Vec<usize>,
    feature_dim: usize,
    target_dim: usize,
}

impl ConcatDataset {
    /// Create a concatenation of the given datasets.
    ///
    /// Fails fast on an empty list or on width disagreement.
    pub fn new(datasets: Vec<Box<dyn Dataset>>) -> Result<Self> {
        let first = datasets
            .first()
            .ok_or_else(|| Error::msg("ConcatDataset: need at least one dataset"))?;
        let feature_dim = first.feature_dim();
        let target_dim = first.target_dim();

        let mut cumulative_sizes = Vec::with_capacity(datasets.len());
        let mut total = 0;
        for ds in &datasets {
            if ds.feature_dim() != feature_dim {
                return Err(Error::DimMismatch {
                    expected: feature_dim,
                    got: ds.feature_dim(),
                });
            }
            if ds.target_dim() != target_dim {
                return Err(Error::DimMismatch {
                    expected: target_dim,
                    got: ds.target_dim(),
                });
            }
            total += ds.len();
            cumulative_sizes.push(total);
        }

        Ok(Self {
            datasets,
            cumulative_sizes,
            feature_dim,
            target_dim,
        })
    }

    /// Locate which dataset and local index a global index maps to.
    fn locate(&self, index: usize) -> (usize, usize) {
        let ds_idx = self.cumulative_sizes.partition_point(|&cum| cum <= index);
        let offset = if ds_idx == 0 {
            0
        } else {
            self.cumulative_sizes[ds_idx - 1]
        };
        (ds_idx, index - offset)
    }
}

impl Dataset for ConcatDataset {
    fn len(&self) -> usize {
        *self.cumulative_sizes.last().unwrap_or(&0)
    }

    fn get(&self, index: usize) -> Sample {
        let (ds_idx, local_idx) = self.locate(index);
        self.datasets[ds_idx].get(local_idx)
    }

    fn feature_dim(&self) -> usize {
        self.feature_dim
    }

    fn target_dim(&self) -> usize {
        self.target_dim
    }

    fn name(&self) -> &str {
        "concat"
    }
}

// RowsDataset — in-memory dataset from raw rows

/// A simple in-memory dataset backed by a `Vec<Sample>`.
pub struct RowsDataset {
    samples: Vec<Sample>,
    feature_dim: usize,
    target_dim: usize,
    dataset_name: String,
}

impl RowsDataset {
    /// Create a dataset from a vector of samples.
    ///
    /// Fails fast when the list is empty or row widths disagree.
    pub fn new(samples: Vec<Sample>, name: &str) -> Result<Self> {
        let first = samples
            .first()
            .ok_or_else(|| Error::msg("RowsDataset: need at least one sample"))?;
        let feature_dim = first.features.len();
        let target_dim = first.target.len();

        for s in &samples {
            if s.features.len() != feature_dim {
                return Err(Error::DimMismatch {
                    expected: feature_dim,
                    got: s.features.len(),
                });
            }
            if s.target.len() != target_dim {
                return Err(Error::DimMismatch {
                    expected: target_dim,
                    got: s.target.len(),
                });
            }
        }

        Ok(Self {
            samples,
            feature_dim,
            target_dim,
            dataset_name: name.to_string(),
        })
    }

    /// Build from flat row-major feature/target buffers.
    ///
    /// `features` is `[n, feature_dim]` and `targets` is `[n, target_dim]`.
    pub fn from_flat(
        features: &[f64],
        feature_dim: usize,
        targets: &[f64],
        target_dim: usize,
        name: &str,
    ) -> Result<Self> {
        if feature_dim == 0 || features.len() % feature_dim != 0 {
            return Err(Error::msg(format!(
                "RowsDataset: {} feature values do not divide into rows of {feature_dim}",
                features.len()
            )));
        }
        let n = features.len() / feature_dim;
        if target_dim == 0 || targets.len() != n * target_dim {
            return Err(Error::LengthMismatch {
                features: n,
                targets: if target_dim == 0 {
                    0
                } else {
                    targets.len() / target_dim
                },
            });
        }

        let samples: Vec<Sample> = (0..n)
            .map(|i| Sample {
                features: features[i * feature_dim..(i + 1) * feature_dim].to_vec(),
                target: targets[i * target_dim..(i + 1) * target_dim].to_vec(),
            })
            .collect();

        Self::new(samples, name)
    }
}

impl Dataset for RowsDataset {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn get(&self, index: usize) -> Sample {
        self.samples[index].clone()
    }

    fn feature_dim(&self) -> usize {
        self.feature_dim
    }

    fn target_dim(&self) -> usize {
        self.target_dim
    }

    fn name(&self) -> &str {
        &self.dataset_name
    }
}

// Train / Validation / Test split

/// Split a dataset into (train, val) or (train, val, test) subsets.
///
/// Returns `SubsetDataset` views over the original dataset. Indices are
/// shuffled with the given seed before slicing, so the same seed always
/// yields the same partition.
///
/// # Arguments
/// * `dataset` — the source dataset
/// * `ratios` — slice of 2 or 3 floats that sum to 1.0, e.g. `[0.8, 0.2]`
/// * `seed` — random seed for reproducible shuffling of indices
pub fn train_test_split<D>(dataset: D, ratios: &[f64], seed: u64) -> Result<Vec<SubsetDataset<D>>>
where
    D: Dataset + Clone,
{
    if !(2..=3).contains(&ratios.len()) {
        crate::bail!("train_test_split: ratios must have 2 or 3 elements");
    }
    let sum: f64 = ratios.iter().sum();
    if (sum - 1.0).abs() > 1e-6 {
        crate::bail!("train_test_split: ratios must sum to 1.0, got {sum}");
    }

    let n = dataset.len();
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let mut splits = Vec::new();
    let mut offset = 0;
    for (i, &ratio) in ratios.iter().enumerate() {
        let count = if i == ratios.len() - 1 {
            n - offset // give remainder to last split
        } else {
            (n as f64 * ratio).round() as usize
        };
        let end = (offset + count).min(n);
        splits.push(SubsetDataset::new(
            dataset.clone(),
            indices[offset..end].to_vec(),
        ));
        offset = end;
    }

    Ok(splits)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tiny helper dataset for testing.
    #[derive(Clone)]
    struct TinyDataset {
        n: usize,
    }

    impl Dataset for TinyDataset {
        fn len(&self) -> usize {
            self.n
        }
        fn get(&self, idx: usize) -> Sample {
            Sample {
                features: vec![idx as f64, idx as f64 * 2.0],
                target: vec![(idx % 3) as f64],
            }
        }
        fn feature_dim(&self) -> usize {
            2
        }
        fn target_dim(&self) -> usize {
            1
        }
    }

    #[test]
    fn subset_dataset() {
        let ds = TinyDataset { n: 10 };
        let sub = SubsetDataset::new(ds, vec![2, 5, 7]);
        assert_eq!(sub.len(), 3);
        assert_eq!(sub.get(0).features[0], 2.0);
        assert_eq!(sub.get(1).features[0], 5.0);
        assert_eq!(sub.get(2).features[0], 7.0);
    }

    #[test]
    fn concat_dataset() {
        let ds1 = TinyDataset { n: 5 };
        let ds2 = TinyDataset { n: 3 };
        let concat = ConcatDataset::new(vec![Box::new(ds1), Box::new(ds2)]).unwrap();
        assert_eq!(concat.len(), 8);
        // First 5 come from ds1, next 3 from ds2
        assert_eq!(concat.get(0).features[0], 0.0);
        assert_eq!(concat.get(4).features[0], 4.0);
        assert_eq!(concat.get(5).features[0], 0.0);
        assert_eq!(concat.get(7).features[0], 2.0);
    }

    #[test]
    fn concat_rejects_width_mismatch() {
        let wide = RowsDataset::from_flat(&[1.0, 2.0, 3.0], 3, &[0.0], 1, "wide").unwrap();
        let narrow = TinyDataset { n: 2 };
        let err = ConcatDataset::new(vec![Box::new(wide), Box::new(narrow)]);
        assert!(matches!(err, Err(Error::DimMismatch { .. })));
    }

    #[test]
    fn rows_dataset_from_flat() {
        let features = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let targets = vec![0.0, 1.0, 0.0];
        let ds = RowsDataset::from_flat(&features, 2, &targets, 1, "test").unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.get(0).features, vec![1.0, 2.0]);
        assert_eq!(ds.get(1).features, vec![3.0, 4.0]);
        assert_eq!(ds.get(2).target, vec![0.0]);
    }

    #[test]
    fn rows_dataset_rejects_ragged_rows() {
        let samples = vec![
            Sample {
                features: vec![1.0, 2.0],
                target: vec![0.0],
            },
            Sample {
                features: vec![3.0],
                target: vec![1.0],
            },
        ];
        assert!(RowsDataset::new(samples, "ragged").is_err());
    }

    #[test]
    fn train_test_split_two_way() {
        let ds = TinyDataset { n: 100 };
        let splits = train_test_split(ds, &[0.8, 0.2], 42).unwrap();
        assert_eq!(splits.len(), 2);
        assert_eq!(splits[0].len() + splits[1].len(), 100);
        assert_eq!(splits[0].len(), 80);
        assert_eq!(splits[1].len(), 20);
    }

    #[test]
    fn train_test_split_three_way() {
        let ds = TinyDataset { n: 100 };
        let splits = train_test_split(ds, &[0.7, 0.15, 0.15], 42).unwrap();
        assert_eq!(splits.len(), 3);
        assert_eq!(splits[0].len() + splits[1].len() + splits[2].len(), 100);
    }

    #[test]
    fn train_test_split_reproducible() {
        let ds1 = TinyDataset { n: 50 };
        let ds2 = TinyDataset { n: 50 };
        let s1 = train_test_split(ds1, &[0.8, 0.2], 123).unwrap();
        let s2 = train_test_split(ds2, &[0.8, 0.2], 123).unwrap();
        // Same seed → same indices → same samples
        for i in 0..s1[0].len() {
            assert_eq!(s1[0].get(i).features, s2[0].get(i).features);
        }
    }
}
