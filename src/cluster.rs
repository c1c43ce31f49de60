//! The two clustering strategies behind one interface
use ndarray::Array1;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

use crate::error::Result;
use crate::hdbscan::{Hdbscan, HdbscanError, HdbscanParams};
use crate::k_means::{KMeans, KMeansError, KMeansParams};
use crate::matrix::FeatureMatrix;
use crate::traits::{Clusterer, Fit, Predict};

/// Label of the rows the density clusterer leaves unassigned
pub const NOISE_LABEL: i64 = -1;

/// Cluster assignment of every row of a feature matrix
#[derive(Clone, Debug, PartialEq)]
pub enum ClusterResult {
    /// Exactly `k` clusters, every row assigned, with the fitted model kept for reuse
    Partition { labels: Array1<usize>, model: KMeans },
    /// A data dependent number of clusters, rows of sparse regions are noise
    Density {
        labels: Array1<Option<usize>>,
        probabilities: Array1<f64>,
        n_clusters: usize,
    },
}

impl ClusterResult {
    /// Integer label of every row, [`NOISE_LABEL`] for noise
    pub fn labels(&self) -> Array1<i64> {
        self.assignments()
            .mapv(|label| label.map_or(NOISE_LABEL, |label| label as i64))
    }

    /// Cluster index of every row, `None` for noise
    pub fn assignments(&self) -> Array1<Option<usize>> {
        match self {
            ClusterResult::Partition { labels, .. } => labels.mapv(Some),
            ClusterResult::Density { labels, .. } => labels.clone(),
        }
    }

    /// Membership probabilities, only known for density clusterings
    pub fn probabilities(&self) -> Option<&Array1<f64>> {
        match self {
            ClusterResult::Partition { .. } => None,
            ClusterResult::Density { probabilities, .. } => Some(probabilities),
        }
    }

    pub fn model(&self) -> Option<&KMeans> {
        match self {
            ClusterResult::Partition { model, .. } => Some(model),
            ClusterResult::Density { .. } => None,
        }
    }

    pub fn n_clusters(&self) -> usize {
        match self {
            ClusterResult::Partition { model, .. } => model.centroids().nrows(),
            ClusterResult::Density { n_clusters, .. } => *n_clusters,
        }
    }

    pub fn nsamples(&self) -> usize {
        match self {
            ClusterResult::Partition { labels, .. } => labels.len(),
            ClusterResult::Density { labels, .. } => labels.len(),
        }
    }

    pub fn n_noise(&self) -> usize {
        match self {
            ClusterResult::Partition { .. } => 0,
            ClusterResult::Density { labels, .. } => {
                labels.iter().filter(|label| label.is_none()).count()
            }
        }
    }
}

/// A configured clustering algorithm
#[derive(Clone, Debug, PartialEq)]
pub enum ClusterStrategy {
    /// k-means with a fixed number of clusters
    Partition(KMeansParams<Xoshiro256Plus>),
    /// HDBSCAN with a minimum cluster size
    Density(HdbscanParams),
}

impl ClusterStrategy {
    /// k-means with default settings, reproducible through `seed`
    pub fn partition(n_clusters: usize, seed: u64) -> Self {
        ClusterStrategy::Partition(KMeans::params_with_rng(
            n_clusters,
            Xoshiro256Plus::seed_from_u64(seed),
        ))
    }

    /// HDBSCAN with default settings
    pub fn density(min_cluster_size: usize) -> Self {
        ClusterStrategy::Density(Hdbscan::params(min_cluster_size))
    }

    /// Short name used in file names
    pub fn method(&self) -> &'static str {
        match self {
            ClusterStrategy::Partition(_) => "kmeans",
            ClusterStrategy::Density(_) => "hdbscan",
        }
    }
}

impl Clusterer for ClusterStrategy {
    fn cluster(&self, matrix: &FeatureMatrix) -> Result<ClusterResult> {
        match self {
            ClusterStrategy::Partition(params) => {
                let model: std::result::Result<KMeans, KMeansError> = params.fit(matrix.records());
                let model = model?;
                let labels = model.predict(matrix.records());
                Ok(ClusterResult::Partition { labels, model })
            }
            ClusterStrategy::Density(params) => {
                let clusters: std::result::Result<Hdbscan, HdbscanError> =
                    params.fit(matrix.records());
                let clusters = clusters?;
                let n_clusters = clusters.n_clusters();
                let (labels, probabilities) = clusters.into_parts();
                Ok(ClusterResult::Density {
                    labels,
                    probabilities,
                    n_clusters,
                })
            }
        }
    }
}
