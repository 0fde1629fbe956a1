//! # Vole
//!
//! A minibatch data pipeline for training loops: synthetic regression
//! data, shuffled/ordered batch loaders, parameter trees, and binary
//! checkpointing.
//!
//! This is the top-level facade crate that re-exports everything you need.
//!
//! ## Usage
//!
//! ```rust
//! use vole::prelude::*;
//! ```
//!
//! ## Architecture
//!
//! | Crate | Purpose |
//! |-------|----------|
//! | `vole-data` | Dataset trait, synthetic regression data, DataLoader, StreamLoader, transforms, combinators |
//! | `vole` | Parameter trees and checkpoint save/load |
//!
//! ## Modules
//!
//! - [`params`] — nested string-keyed parameter trees with flatten/unflatten
//! - [`checkpoint`] — save/load named parameter arrays

/// Re-export the data pipeline.
pub use vole_data::{
    regression_targets, train_test_split, Batch, Batches, Compose, ConcatDataset, DataLoader,
    DataLoaderConfig, Dataset, Error, Normalize, Result, RowsDataset, Sample, ShuffleBuffer,
    Split, Standardize, StreamBatches, StreamConfig, StreamLoader, SubsetDataset,
    SyntheticConfig, SyntheticRegression, Transform,
};

/// Checkpoint — save and load named parameter arrays.
pub mod checkpoint;

/// Parameter trees — nested string-keyed arrays with flatten/unflatten.
pub mod params;

/// Prelude: import this for the most common types.
pub mod prelude {
    pub use crate::checkpoint::{self, CheckpointError};
    pub use crate::params::{ParamError, ParamNode, ParamTree};
    pub use vole_data::{
        Batch, DataLoader, DataLoaderConfig, Dataset, Sample, Split, StreamConfig, StreamLoader,
        SyntheticConfig, SyntheticRegression, Transform,
    };
}
