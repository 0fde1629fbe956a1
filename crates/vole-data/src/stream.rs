// StreamLoader — shuffle-buffer sampling and batching
//
// The second loader variant. Instead of materializing and permuting the
// whole index range up front, indices flow through a bounded shuffle
// buffer: the buffer is kept full from the underlying stream and each
// draw removes a uniformly random element from it. With the buffer sized
// to the whole slice this is a true uniform shuffle; with capacity 1 the
// stream passes through in its original order.

use std::ops::Range;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::loader::Batch;
use crate::transform::Transform;

/// Configuration for the StreamLoader.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Number of samples per batch.
    pub batch_size: usize,
    /// Whether to shuffle. When set, the buffer spans the full slice;
    /// otherwise it degenerates to capacity 1 (no reordering).
    pub shuffle: bool,
    /// Optional random seed for reproducible shuffling.
    pub seed: Option<u64>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            shuffle: true,
            seed: None,
        }
    }
}

impl StreamConfig {
    pub fn batch_size(mut self, bs: usize) -> Self {
        self.batch_size = bs;
        self
    }

    pub fn shuffle(mut self, s: bool) -> Self {
        self.shuffle = s;
        self
    }

    pub fn seed(mut self, s: u64) -> Self {
        self.seed = Some(s);
        self
    }
}

/// A bounded pool that yields uniformly random draws from its input.
///
/// The pool is refilled from `inner` before every draw, so it holds up to
/// `capacity` pending items. Sampling picks one pool slot uniformly and
/// swap-removes it. Capacity 1 forwards the input unchanged.
pub struct ShuffleBuffer<I: Iterator> {
    inner: I,
    buffer: Vec<I::Item>,
    capacity: usize,
    rng: StdRng,
}

impl<I: Iterator> ShuffleBuffer<I> {
    /// Wrap `inner` with a pool of the given capacity.
    ///
    /// A capacity of 0 is treated as 1.
    pub fn new(inner: I, capacity: usize, rng: StdRng) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            capacity: capacity.max(1),
            rng,
        }
    }
}

impl<I: Iterator> Iterator for ShuffleBuffer<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        while self.buffer.len() < self.capacity {
            match self.inner.next() {
                Some(item) => self.buffer.push(item),
                None => break,
            }
        }
        if self.buffer.is_empty() {
            return None;
        }
        let pick = if self.buffer.len() > 1 {
            self.rng.gen_range(0..self.buffer.len())
        } else {
            0
        };
        Some(self.buffer.swap_remove(pick))
    }
}

/// A loader that delegates order selection to a [`ShuffleBuffer`].
///
/// Same external contract as [`DataLoader`](crate::loader::DataLoader):
/// a lazy, finite, restartable sequence of batches over a contiguous
/// index range, reshuffled per pass when `shuffle` is set and replayed
/// in ascending order when it is not.
pub struct StreamLoader<'a> {
    dataset: &'a dyn Dataset,
    range: Range<usize>,
    config: StreamConfig,
    transforms: Vec<Box<dyn Transform>>,
    rng: StdRng,
}

impl<'a> StreamLoader<'a> {
    /// Create a loader over the whole dataset.
    pub fn new(dataset: &'a dyn Dataset, config: StreamConfig) -> Result<Self> {
        let len = dataset.len();
        Self::over_range(dataset, 0..len, config)
    }

    /// Create a loader over a contiguous index range of the dataset.
    pub fn over_range(
        dataset: &'a dyn Dataset,
        range: Range<usize>,
        config: StreamConfig,
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
            range,
            config,
            transforms: Vec::new(),
            rng,
        })
    }

    /// Add a transform to apply to each sample.
    pub fn with_transform(mut self, t: Box<dyn Transform>) -> Self {
        self.transforms.push(t);
        self
    }

    /// The number of batches per pass: `ceil(slice_len / batch_size)`.
    pub fn num_batches(&self) -> usize {
        self.range.len().div_ceil(self.config.batch_size)
    }

    /// Total number of samples this loader covers.
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Whether the covered range is empty.
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Start one pass over the covered range.
    pub fn iter(&mut self) -> StreamBatches<'_, 'a> {
        // Derive a per-pass generator so seeded loaders advance across
        // passes instead of replaying one shuffle.
        let pass_rng = StdRng::seed_from_u64(self.rng.gen());
        let capacity = if self.config.shuffle {
            self.range.len()
        } else {
            1
        };
        StreamBatches {
            loader: self,
            indices: ShuffleBuffer::new(self.range.clone(), capacity, pass_rng),
        }
    }
}

/// Iterator that yields one [`Batch`] at a time from the shuffle buffer.
pub struct StreamBatches<'l, 'a> {
    loader: &'l StreamLoader<'a>,
    indices: ShuffleBuffer<Range<usize>>,
}

impl Iterator for StreamBatches<'_, '_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Self::Item> {
        let mut samples = Vec::with_capacity(self.loader.config.batch_size);
        while samples.len() < self.loader.config.batch_size {
            match self.indices.next() {
                Some(i) => {
                    let mut s = self.loader.dataset.get(i);
                    for t in &self.loader.transforms {
                        s = t.apply(s);
                    }
                    samples.push(s);
                }
                None => break,
            }
        }
        if samples.is_empty() {
            return None;
        }
        Some(Batch::from_samples(&samples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_one_passes_through_in_order() {
        let rng = StdRng::seed_from_u64(0);
        let out: Vec<usize> = ShuffleBuffer::new(0..10, 1, rng).collect();
        assert_eq!(out, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn full_capacity_yields_a_permutation() {
        let rng = StdRng::seed_from_u64(3);
        let mut out: Vec<usize> = ShuffleBuffer::new(0..50, 50, rng).collect();
        assert_ne!(out, (0..50).collect::<Vec<_>>());
        out.sort_unstable();
        assert_eq!(out, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn same_seed_draws_the_same_order() {
        let a: Vec<usize> =
            ShuffleBuffer::new(0..20, 20, StdRng::seed_from_u64(8)).collect();
        let b: Vec<usize> =
            ShuffleBuffer::new(0..20, 20, StdRng::seed_from_u64(8)).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn small_buffer_drains_everything() {
        let rng = StdRng::seed_from_u64(5);
        let mut out: Vec<usize> = ShuffleBuffer::new(0..100, 4, rng).collect();
        assert_eq!(out.len(), 100);
        out.sort_unstable();
        assert_eq!(out, (0..100).collect::<Vec<_>>());
    }
}
