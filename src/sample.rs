//! Cap the number of rows before the expensive steps
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

use crate::frame::Frame;

/// Number of rows kept unless configured otherwise
pub const DEFAULT_MAX_SAMPLES: usize = 2000;

/// Draws a uniform random subset of a dataset which exceeds `max_samples` rows
///
/// Datasets with at most `max_samples` rows pass through unchanged, in their original order.
/// Larger datasets are reduced to exactly `max_samples` rows drawn without replacement.
#[derive(Clone, Debug)]
pub struct Sampler<R: Rng> {
    max_samples: usize,
    rng: R,
}

impl Sampler<Xoshiro256Plus> {
    /// A sampler seeded from the thread local generator, so every run draws a different subset
    pub fn new(max_samples: usize) -> Self {
        Self::with_rng(max_samples, Xoshiro256Plus::seed_from_u64(rand::random()))
    }

    /// A reproducible sampler
    pub fn seeded(max_samples: usize, seed: u64) -> Self {
        Self::with_rng(max_samples, Xoshiro256Plus::seed_from_u64(seed))
    }
}

impl Default for Sampler<Xoshiro256Plus> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SAMPLES)
    }
}

impl<R: Rng> Sampler<R> {
    pub fn with_rng(max_samples: usize, rng: R) -> Self {
        Sampler { max_samples, rng }
    }

    pub fn max_samples(&self) -> usize {
        self.max_samples
    }

    /// Whether a dataset of `nrows` rows would be reduced
    pub fn exceeds(&self, nrows: usize) -> bool {
        nrows > self.max_samples
    }

    /// Indices of the rows to keep out of `nrows`
    pub fn indices(&mut self, nrows: usize) -> Vec<usize> {
        if self.exceeds(nrows) {
            index::sample(&mut self.rng, nrows, self.max_samples).into_vec()
        } else {
            (0..nrows).collect()
        }
    }

    pub fn sample(&mut self, frame: &Frame) -> Frame {
        if self.exceeds(frame.nrows()) {
            let indices = self.indices(frame.nrows());
            frame.select_rows(&indices)
        } else {
            frame.clone()
        }
    }
}
