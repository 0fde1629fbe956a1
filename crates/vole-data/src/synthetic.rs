// Synthetic regression data — y = Xw + b + noise

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::dataset::{Dataset, Sample};
use crate::error::{Error, Result};
use crate::loader::{DataLoader, DataLoaderConfig};
use crate::stream::{StreamConfig, StreamLoader};

/// Which contiguous slice of the dataset a loader covers.
///
/// The first `num_train` rows are the training split; the remaining
/// `num_val` rows are the validation split. Training loaders shuffle,
/// validation loaders replay ascending order so validation passes stay
/// reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Val,
}

/// Configuration for synthetic linear-regression data.
///
/// Immutable after construction; the feature width is `weights.len()`.
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// True weight vector `w`.
    pub weights: Vec<f64>,
    /// True bias `b`.
    pub bias: f64,
    /// Standard deviation of the label noise. Zero means exact labels.
    pub noise_std: f64,
    /// Number of training rows (the leading slice).
    pub num_train: usize,
    /// Number of validation rows (the trailing slice).
    pub num_val: usize,
    /// Optional seed; without one, draws are fresh each construction.
    pub seed: Option<u64>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            weights: vec![2.0, -3.4],
            bias: 4.2,
            noise_std: 0.01,
            num_train: 1000,
            num_val: 1000,
            seed: None,
        }
    }
}

impl SyntheticConfig {
    pub fn weights(mut self, w: Vec<f64>) -> Self {
        self.weights = w;
        self
    }

    pub fn bias(mut self, b: f64) -> Self {
        self.bias = b;
        self
    }

    pub fn noise_std(mut self, s: f64) -> Self {
        self.noise_std = s;
        self
    }

    pub fn num_train(mut self, n: usize) -> Self {
        self.num_train = n;
        self
    }

    pub fn num_val(mut self, n: usize) -> Self {
        self.num_val = n;
        self
    }

    pub fn seed(mut self, s: u64) -> Self {
        self.seed = Some(s);
        self
    }
}

/// Compute regression targets `Xw + b` with optional Gaussian noise.
///
/// The generator handle is passed in explicitly so callers control
/// reproducibility. Fails fast when the weight vector disagrees with the
/// feature width.
pub fn regression_targets(
    features: &Array2<f64>,
    weights: &[f64],
    bias: f64,
    noise_std: f64,
    rng: &mut StdRng,
) -> Result<Array1<f64>> {
    if features.ncols() != weights.len() {
        return Err(Error::DimMismatch {
            expected: features.ncols(),
            got: weights.len(),
        });
    }
    let w = Array1::from(weights.to_vec());
    let mut targets = features.dot(&w) + bias;
    if noise_std > 0.0 {
        for v in targets.iter_mut() {
            *v += noise_std * rng.sample::<f64, _>(StandardNormal);
        }
    }
    Ok(targets)
}

/// An in-memory regression dataset with a contiguous train/val split.
///
/// Holds `n = num_train + num_val` feature rows and a parallel `[n, 1]`
/// target column. Feature and target row counts are equal by
/// construction, and the split point partitions the rows into a training
/// prefix and a validation suffix.
#[derive(Debug, Clone)]
pub struct SyntheticRegression {
    features: Array2<f64>,
    targets: Array2<f64>,
    num_train: usize,
}

impl SyntheticRegression {
    /// Generate a dataset from the given configuration.
    ///
    /// Features are drawn i.i.d. from `N(0, 1)`; targets follow
    /// `y = Xw + b + eps` with `eps ~ N(0, noise_std)`.
    pub fn generate(config: SyntheticConfig) -> Result<Self> {
        let d = config.weights.len();
        if d == 0 {
            crate::bail!("synthetic data needs at least one weight");
        }
        let n = config.num_train + config.num_val;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let features = Array2::from_shape_fn((n, d), |_| rng.sample(StandardNormal));
        let targets = regression_targets(
            &features,
            &config.weights,
            config.bias,
            config.noise_std,
            &mut rng,
        )?
        .insert_axis(Axis(1));

        Ok(Self {
            features,
            targets,
            num_train: config.num_train,
        })
    }

    /// Wrap existing arrays, keeping the first `num_train` rows as the
    /// training split.
    ///
    /// Fails fast when the row counts differ or the split point lies past
    /// the end.
    pub fn from_arrays(
        features: Array2<f64>,
        targets: Array2<f64>,
        num_train: usize,
    ) -> Result<Self> {
        if features.nrows() != targets.nrows() {
            return Err(Error::LengthMismatch {
                features: features.nrows(),
                targets: targets.nrows(),
            });
        }
        if num_train > features.nrows() {
            return Err(Error::BadSplit {
                num_train,
                len: features.nrows(),
            });
        }
        Ok(Self {
            features,
            targets,
            num_train,
        })
    }

    /// The full feature matrix, `[n, d]`.
    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    /// The full target column, `[n, 1]`.
    pub fn targets(&self) -> &Array2<f64> {
        &self.targets
    }

    /// Number of rows in the training split.
    pub fn num_train(&self) -> usize {
        self.num_train
    }

    /// Number of rows in the validation split.
    pub fn num_val(&self) -> usize {
        self.features.nrows() - self.num_train
    }

    /// Index range covered by a split.
    pub fn split_range(&self, split: Split) -> std::ops::Range<usize> {
        match split {
            Split::Train => 0..self.num_train,
            Split::Val => self.num_train..self.features.nrows(),
        }
    }

    /// Build a [`DataLoader`] over one split.
    ///
    /// The split decides the iteration order: `Train` permutes per pass,
    /// `Val` always replays ascending order regardless of `config.shuffle`.
    pub fn loader(&self, split: Split, config: DataLoaderConfig) -> Result<DataLoader<'_>> {
        let config = config.shuffle(matches!(split, Split::Train));
        DataLoader::over_range(self, self.split_range(split), config)
    }

    /// Build a [`StreamLoader`] over one split.
    ///
    /// The shuffle buffer spans the whole split for `Train` and collapses
    /// to capacity 1 for `Val`.
    pub fn stream_loader(&self, split: Split, config: StreamConfig) -> Result<StreamLoader<'_>> {
        let config = config.shuffle(matches!(split, Split::Train));
        StreamLoader::over_range(self, self.split_range(split), config)
    }
}

impl Dataset for SyntheticRegression {
    fn len(&self) -> usize {
        self.features.nrows()
    }

    fn get(&self, index: usize) -> Sample {
        Sample {
            features: self.features.row(index).to_vec(),
            target: self.targets.row(index).to_vec(),
        }
    }

    fn feature_dim(&self) -> usize {
        self.features.ncols()
    }

    fn target_dim(&self) -> usize {
        self.targets.ncols()
    }

    fn name(&self) -> &str {
        "synthetic-regression"
    }
}
