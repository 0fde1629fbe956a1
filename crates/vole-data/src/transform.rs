// Transform — per-sample preprocessing applied before batching

use crate::dataset::Sample;

/// A transform applied to each sample before batching.
pub trait Transform: Send + Sync {
    /// Apply the transform to a sample, returning the modified sample.
    fn apply(&self, sample: Sample) -> Sample;
}

// Built-in transforms

/// Scale features to [0, 1] by dividing by a given factor.
#[derive(Debug, Clone)]
pub struct Normalize {
    scale: f64,
}

impl Normalize {
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }
}

impl Transform for Normalize {
    fn apply(&self, mut sample: Sample) -> Sample {
        for v in &mut sample.features {
            *v /= self.scale;
        }
        sample
    }
}

/// Standardize features to zero mean and unit variance.
#[derive(Debug, Clone)]
pub struct Standardize {
    pub mean: f64,
    pub std: f64,
}

impl Standardize {
    pub fn new(mean: f64, std: f64) -> Self {
        Self { mean, std }
    }
}

impl Transform for Standardize {
    fn apply(&self, mut sample: Sample) -> Sample {
        for v in &mut sample.features {
            *v = (*v - self.mean) / self.std;
        }
        sample
    }
}

/// Chain multiple transforms.
pub struct Compose {
    transforms: Vec<Box<dyn Transform>>,
}

impl Compose {
    pub fn new(transforms: Vec<Box<dyn Transform>>) -> Self {
        Self { transforms }
    }
}

impl Transform for Compose {
    fn apply(&self, mut sample: Sample) -> Sample {
        for t in &self.transforms {
            sample = t.apply(sample);
        }
        sample
    }
}
