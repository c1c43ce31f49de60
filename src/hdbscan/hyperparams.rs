use crate::distance::CommonDistance;
use crate::param_guard::ParamGuard;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};
use thiserror::Error;

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
/// The set of hyperparameters that can be specified for the execution of
/// the [HDBSCAN algorithm](crate::hdbscan::Hdbscan).
pub struct HdbscanValidParams {
    pub(crate) min_cluster_size: usize,
    pub(crate) min_samples: Option<usize>,
    pub(crate) dist_fn: CommonDistance,
    pub(crate) allow_single_cluster: bool,
}

#[derive(Clone, Debug, PartialEq)]
/// Helper struct for building a set of [HDBSCAN hyperparameters](HdbscanValidParams)
pub struct HdbscanParams(HdbscanValidParams);

#[derive(Error, Debug)]
pub enum HdbscanParamsError {
    #[error("min_cluster_size must be at least 2")]
    MinClusterSize,
    #[error("min_samples must be at least 1")]
    MinSamples,
}

impl HdbscanParams {
    pub(crate) fn new(min_cluster_size: usize) -> Self {
        Self(HdbscanValidParams {
            min_cluster_size,
            min_samples: None,
            dist_fn: CommonDistance::default(),
            allow_single_cluster: false,
        })
    }

    /// Set the neighbourhood size used for core distances, defaults to `min_cluster_size`
    pub fn min_samples(mut self, min_samples: usize) -> Self {
        self.0.min_samples = Some(min_samples);
        self
    }

    /// Set the distance metric
    pub fn dist_fn(mut self, dist_fn: CommonDistance) -> Self {
        self.0.dist_fn = dist_fn;
        self
    }

    /// Whether the root of the cluster hierarchy may be selected as the only cluster
    pub fn allow_single_cluster(mut self, allow: bool) -> Self {
        self.0.allow_single_cluster = allow;
        self
    }
}

impl ParamGuard for HdbscanParams {
    type Checked = HdbscanValidParams;
    type Error = HdbscanParamsError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.min_cluster_size < 2 {
            Err(HdbscanParamsError::MinClusterSize)
        } else if self.0.min_samples == Some(0) {
            Err(HdbscanParamsError::MinSamples)
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl HdbscanValidParams {
    /// Smallest group of rows that is reported as a cluster
    pub fn min_cluster_size(&self) -> usize {
        self.min_cluster_size
    }

    /// Rows in the neighbourhood of a core row, the row itself included
    pub fn min_samples(&self) -> usize {
        self.min_samples.unwrap_or(self.min_cluster_size)
    }

    /// Distance metric used for core and mutual reachability distances
    pub fn dist_fn(&self) -> &CommonDistance {
        &self.dist_fn
    }

    pub fn allow_single_cluster(&self) -> bool {
        self.allow_single_cluster
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hdbscan::Hdbscan;

    #[test]
    fn min_cluster_size_at_least_2() {
        for size in 0..2 {
            let res = Hdbscan::params(size).check();
            assert!(matches!(res, Err(HdbscanParamsError::MinClusterSize)));
        }
        assert!(Hdbscan::params(2).check().is_ok());
    }

    #[test]
    fn min_samples_cannot_be_zero() {
        let res = Hdbscan::params(5).min_samples(0).check();
        assert!(matches!(res, Err(HdbscanParamsError::MinSamples)));
    }

    #[test]
    fn min_samples_defaults_to_min_cluster_size() {
        let params = Hdbscan::params(7).check_unwrap();
        assert_eq!(params.min_samples(), 7);
        assert_eq!(params.dist_fn(), &CommonDistance::L2Dist);
        assert!(!params.allow_single_cluster());

        let params = Hdbscan::params(7).min_samples(3).check_unwrap();
        assert_eq!(params.min_samples(), 3);
    }
}
