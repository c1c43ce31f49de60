use crate::k_means::KMeansParamsError;

use super::init::KMeansInit;
use crate::param_guard::ParamGuard;
use rand::Rng;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
/// Checked settings of the [partition clusterer](crate::k_means::KMeans)
pub struct KMeansValidParams<R: Rng> {
    n_runs: usize,
    /// Largest centroid shift, in euclidean norm over all centroids, still counted as movement
    tolerance: f64,
    max_n_iterations: u64,
    n_clusters: usize,
    init: KMeansInit,
    rng: R,
}

#[derive(Clone, Debug, PartialEq)]
/// Builder of the [partition clusterer settings](KMeansValidParams)
pub struct KMeansParams<R: Rng>(KMeansValidParams<R>);

impl<R: Rng> KMeansParams<R> {
    /// Look for `n_clusters` groups of explanation rows, drawing initial centroids from `rng`.
    ///
    /// A run stops once no row changes cluster, the centroids move by at most `tolerance`,
    /// or after `max_n_iterations` assignment and update rounds. Out of `n_runs` runs the one
    /// with the lowest inertia is kept.
    ///
    /// Defaults:
    /// * `n_runs = 10`
    /// * `tolerance = 1e-4`
    /// * `max_n_iterations = 300`
    /// * `init = KMeansPlusPlus`
    pub fn new(n_clusters: usize, rng: R) -> Self {
        Self(KMeansValidParams {
            n_runs: 10,
            tolerance: 1e-4,
            max_n_iterations: 300,
            n_clusters,
            init: KMeansInit::KMeansPlusPlus,
            rng,
        })
    }

    pub fn n_runs(mut self, n_runs: usize) -> Self {
        self.0.n_runs = n_runs;
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.0.tolerance = tolerance;
        self
    }

    pub fn max_n_iterations(mut self, max_n_iterations: u64) -> Self {
        self.0.max_n_iterations = max_n_iterations;
        self
    }

    /// How the first centroids of every run are picked
    pub fn init_method(mut self, init: KMeansInit) -> Self {
        self.0.init = init;
        self
    }
}

impl<R: Rng> ParamGuard for KMeansParams<R> {
    type Checked = KMeansValidParams<R>;
    type Error = KMeansParamsError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.n_clusters == 0 {
            Err(KMeansParamsError::NClusters)
        } else if self.0.n_runs == 0 {
            Err(KMeansParamsError::NRuns)
        } else if self.0.tolerance.is_nan() || self.0.tolerance <= 0. {
            Err(KMeansParamsError::Tolerance)
        } else if self.0.max_n_iterations == 0 {
            Err(KMeansParamsError::MaxIterations)
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl<R: Rng> KMeansValidParams<R> {
    pub fn n_runs(&self) -> usize {
        self.n_runs
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn max_n_iterations(&self) -> u64 {
        self.max_n_iterations
    }

    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    pub fn init_method(&self) -> KMeansInit {
        self.init
    }

    /// Generator the runs derive their initial centroids from
    pub fn rng(&self) -> &R {
        &self.rng
    }
}

#[cfg(test)]
mod tests {
    use crate::k_means::{KMeans, KMeansInit, KMeansParams, KMeansParamsError, KMeansValidParams};
    use crate::param_guard::ParamGuard;
    use rand_xoshiro::Xoshiro256Plus;

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<KMeansParams<Xoshiro256Plus>>();
        has_autotraits::<KMeansValidParams<Xoshiro256Plus>>();
    }

    #[test]
    fn defaults() {
        let params = KMeans::params(3).check_unwrap();
        assert_eq!(params.n_clusters(), 3);
        assert_eq!(params.n_runs(), 10);
        assert_eq!(params.tolerance(), 1e-4);
        assert_eq!(params.max_n_iterations(), 300);
        assert_eq!(params.init_method(), KMeansInit::KMeansPlusPlus);
    }

    #[test]
    fn invalid_settings() {
        assert!(matches!(
            KMeans::params(0).check(),
            Err(KMeansParamsError::NClusters)
        ));
        assert!(matches!(
            KMeans::params(2).n_runs(0).check(),
            Err(KMeansParamsError::NRuns)
        ));
        for tolerance in [-1., 0., f64::NAN] {
            assert!(matches!(
                KMeans::params(2).tolerance(tolerance).check(),
                Err(KMeansParamsError::Tolerance)
            ));
        }
        assert!(matches!(
            KMeans::params(2).max_n_iterations(0).check(),
            Err(KMeansParamsError::MaxIterations)
        ));
    }
}
