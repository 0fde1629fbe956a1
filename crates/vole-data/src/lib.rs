//! # vole-data
//!
//! Datasets, minibatch loaders, and sample transforms for Vole.
//!
//! This crate provides:
//! - [`Dataset`] trait — unified interface for any tabular data source
//! - [`SyntheticRegression`] — seeded `y = Xw + b + noise` data with a
//!   contiguous train/validation split
//! - [`DataLoader`] — permute-and-slice batching over an index range
//! - [`StreamLoader`] — shuffle-buffer batching with the same contract
//! - Dataset combinators — SubsetDataset, ConcatDataset, RowsDataset,
//!   seeded train/test splitting
//! - Sample transforms — Normalize, Standardize, Compose
//!
//! Training loaders reshuffle on every pass; validation loaders replay
//! ascending index order so validation runs stay reproducible.

pub mod combinators;
pub mod dataset;
pub mod error;
pub mod loader;
pub mod stream;
pub mod synthetic;
pub mod transform;

pub use combinators::{train_test_split, ConcatDataset, RowsDataset, SubsetDataset};
pub use dataset::{Dataset, Sample};
pub use error::{Error, Result};
pub use loader::{Batch, Batches, DataLoader, DataLoaderConfig};
pub use stream::{ShuffleBuffer, StreamBatches, StreamConfig, StreamLoader};
pub use synthetic::{regression_targets, Split, SyntheticConfig, SyntheticRegression};
pub use transform::{Compose, Normalize, Standardize, Transform};
