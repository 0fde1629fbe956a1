/// All errors produced by the data pipeline.
///
/// Every failure mode here is a construction-time check: mismatched array
/// lengths, a weight vector that disagrees with the feature width, a zero
/// batch size, or a split index past the end of the data. Iteration itself
/// never fails once a loader has been built.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Weight vector width disagrees with the feature width.
    #[error("dimension mismatch: expected width {expected}, got {got}")]
    DimMismatch { expected: usize, got: usize },

    /// Feature and target matrices have different row counts.
    #[error("length mismatch: {features} feature rows vs {targets} target rows")]
    LengthMismatch { features: usize, targets: usize },

    /// Loaders require at least one sample per batch.
    #[error("batch_size must be at least 1")]
    InvalidBatchSize,

    /// Split boundary lies outside the dataset.
    #[error("split index {num_train} out of range for {len} samples")]
    BadSplit { num_train: usize, len: usize },

    /// Generic message for cases not covered above.
    #[error("{0}")]
    Msg(String),
}

impl Error {
    /// Create an error from any string message.
    pub fn msg(s: impl Into<String>) -> Self {
        Error::Msg(s.into())
    }
}

/// Convenience Result type used throughout Vole.
pub type Result<T> = std::result::Result<T, Error>;

/// Macro for early return with a formatted error message.
/// Usage: `bail!("something went wrong: {}", detail)`
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::Msg(format!($($arg)*)))
    };
}
