// DataLoader — index permutation, slicing, batching

use std::ops::Range;

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use rayon::prelude::*;

use crate::dataset::{Dataset, Sample};
use crate::error::{Error, Result};
use crate::transform::Transform;

/// Configuration for the DataLoader.
#[derive(Debug, Clone)]
pub struct DataLoaderConfig {
    /// Number of samples per batch.
    pub batch_size: usize,
    /// Whether to permute indices before each pass.
    pub shuffle: bool,
    /// Whether to drop the last incomplete batch.
    pub drop_last: bool,
    /// Number of parallel workers for sample fetching (0 = sequential).
    pub num_workers: usize,
    /// Optional random seed for reproducible shuffling.
    pub seed: Option<u64>,
}

impl Default for DataLoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            shuffle: true,
            drop_last: false,
            num_workers: 0,
            seed: None,
        }
    }
}

impl DataLoaderConfig {
    pub fn batch_size(mut self, bs: usize) -> Self {
        self.batch_size = bs;
        self
    }

    pub fn shuffle(mut self, s: bool) -> Self {
        self.shuffle = s;
        self
    }

    pub fn drop_last(mut self, d: bool) -> Self {
        self.drop_last = d;
        self
    }

    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    pub fn seed(mut self, s: u64) -> Self {
        self.seed = Some(s);
        self
    }
}

/// One minibatch: stacked feature and target rows.
///
/// `features` is `[m, feature_dim]` and `targets` is `[m, target_dim]`
/// with `m <= batch_size`; the final batch of a pass may be short.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub features: Array2<f64>,
    pub targets: Array2<f64>,
}

impl Batch {
    /// Stack samples row-by-row into one batch.
    ///
    /// All samples must share the widths of the first one.
    pub fn from_samples(samples: &[Sample]) -> Self {
        let m = samples.len();
        let feature_dim = samples.first().map_or(0, |s| s.features.len());
        let target_dim = samples.first().map_or(0, |s| s.target.len());

        let mut features = Array2::zeros((m, feature_dim));
        let mut targets = Array2::zeros((m, target_dim));
        for (row, s) in samples.iter().enumerate() {
            for (col, &v) in s.features.iter().enumerate() {
                features[[row, col]] = v;
            }
            for (col, &v) in s.target.iter().enumerate() {
                targets[[row, col]] = v;
            }
        }

        Self { features, targets }
    }

    /// Number of samples in this batch.
    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    /// Whether the batch holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A DataLoader slices a contiguous index range of a dataset into batches.
///
/// When `shuffle` is set, the range is permuted uniformly before each pass
/// with the loader's own generator; otherwise indices are visited in
/// ascending order, so repeated passes reproduce the same batches.
pub struct DataLoader<'a> {
    dataset: &'a dyn Dataset,
    config: DataLoaderConfig,
    transforms: Vec<Box<dyn Transform>>,
    indices: Vec<usize>,
    rng: StdRng,
}

impl<'a> DataLoader<'a> {
    /// Create a loader over the whole dataset.
    pub fn new(dataset: &'a dyn Dataset, config: DataLoaderConfig) -> Result<Self> {
        let len = dataset.len();
        Self::over_range(dataset, 0..len, config)
    }

    /// Create a loader over a contiguous index range of the dataset.
    pub fn over_range(
        dataset: &'a dyn Dataset,
        range: Range<usize>,
        config: DataLoaderConfig,
    ) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(Error::InvalidBatchSize);
        }
        if range.end > dataset.len() {
            return Err(Error::BadSplit {
                num_train: range.end,
                len: dataset.len(),
            });
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            dataset,
            config,
            transforms: Vec::new(),
            indices: range.collect(),
            rng,
        })
    }

    /// Add a transform to apply to each sample.
    pub fn with_transform(mut self, t: Box<dyn Transform>) -> Self {
        self.transforms.push(t);
        self
    }

    /// The number of batches per pass.
    pub fn num_batches(&self) -> usize {
        if self.config.drop_last {
            self.indices.len() / self.config.batch_size
        } else {
            self.indices.len().div_ceil(self.config.batch_size)
        }
    }

    /// Total number of samples this loader covers.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether the covered range is empty.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Permute the visit order for the next pass.
    ///
    /// Advances the loader's generator, so a seeded loader produces a
    /// reproducible sequence of distinct permutations across passes.
    fn reshuffle(&mut self) {
        if self.config.shuffle {
            self.indices.shuffle(&mut self.rng);
            tracing::debug!(samples = self.indices.len(), "reshuffled index order");
        }
    }

    /// Fetch a slice of samples, optionally in parallel via rayon.
    fn fetch_samples(&self, indices: &[usize]) -> Vec<Sample> {
        if self.config.num_workers > 0 && indices.len() > 1 {
            indices
                .par_iter()
                .map(|&i| {
                    let mut s = self.dataset.get(i);
                    for t in &self.transforms {
                        s = t.apply(s);
                    }
                    s
                })
                .collect()
        } else {
            indices
                .iter()
                .map(|&i| {
                    let mut s = self.dataset.get(i);
                    for t in &self.transforms {
                        s = t.apply(s);
                    }
                    s
                })
                .collect()
        }
    }

    /// Start one pass over the covered range.
    ///
    /// Each call begins a fresh pass: shuffling loaders re-permute, ordered
    /// loaders replay the same ascending order. The returned iterator is
    /// lazy and finite.
    pub fn iter(&mut self) -> Batches<'_, 'a> {
        self.reshuffle();
        Batches {
            loader: self,
            batch_idx: 0,
        }
    }
}

/// Iterator that yields one [`Batch`] at a time.
pub struct Batches<'l, 'a> {
    loader: &'l DataLoader<'a>,
    batch_idx: usize,
}

impl Iterator for Batches<'_, '_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Self::Item> {
        let bs = self.loader.config.batch_size;
        let n = self.loader.indices.len();
        let start = self.batch_idx * bs;

        if start >= n {
            return None;
        }
        if self.loader.config.drop_last && start + bs > n {
            return None;
        }

        let end = (start + bs).min(n);
        self.batch_idx += 1;

        let samples = self.loader.fetch_samples(&self.loader.indices[start..end]);
        Some(Batch::from_samples(&samples))
    }
}
