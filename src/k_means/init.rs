use super::algorithm::closest_centroid;
use ndarray::{s, Array1, Array2, ArrayView2, Axis};
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::index;
use rand::Rng;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
#[non_exhaustive]
/// Specifies centroid initialization algorithm for KMeans.
pub enum KMeansInit {
    /// Pick random points as centroids.
    Random,
    /// K-means++ algorithm. Using this over random initialization causes K-means to converge
    /// faster for almost all cases, since K-means++ produces better centroids.
    KMeansPlusPlus,
}

impl KMeansInit {
    /// Runs the chosen initialization routine
    pub(crate) fn run(
        &self,
        n_clusters: usize,
        observations: ArrayView2<f64>,
        rng: &mut impl Rng,
    ) -> Array2<f64> {
        match self {
            Self::Random => random_init(n_clusters, observations, rng),
            Self::KMeansPlusPlus => k_means_plusplus(n_clusters, observations, rng),
        }
    }
}

/// Pick random points from the input matrix as centroids
fn random_init(n_clusters: usize, observations: ArrayView2<f64>, rng: &mut impl Rng) -> Array2<f64> {
    let (n_samples, _) = observations.dim();
    let indices = index::sample(rng, n_samples, n_clusters).into_vec();
    observations.select(Axis(0), &indices)
}

/// Selects centroids using the KMeans++ initialization algorithm. The weights determine the
/// likeliness of an input point to be selected as a centroid relative to other points. The higher
/// the weight, the more likely the point will be selected as a centroid.
fn weighted_k_means_plusplus(
    n_clusters: usize,
    observations: ArrayView2<f64>,
    weights: &Array1<f64>,
    rng: &mut impl Rng,
) -> Array2<f64> {
    let (n_samples, n_features) = observations.dim();
    let mut centroids = Array2::zeros((n_clusters, n_features));
    let first = rng.gen_range(0..n_samples);
    centroids.row_mut(0).assign(&observations.row(first));

    let mut dists = Array1::zeros(n_samples);
    for c_cnt in 1..n_clusters {
        let chosen = centroids.slice(s![0..c_cnt, ..]);
        for (obs, dist) in observations.rows().into_iter().zip(dists.iter_mut()) {
            *dist = closest_centroid(&chosen, &obs).1;
        }
        dists *= weights;

        // Every remaining point sits on a chosen centroid, so any of them will do
        let centroid_idx = match WeightedIndex::new(dists.iter()) {
            Ok(distribution) => distribution.sample(rng),
            Err(_) => rng.gen_range(0..n_samples),
        };
        centroids
            .row_mut(c_cnt)
            .assign(&observations.row(centroid_idx));
    }
    centroids
}

fn k_means_plusplus(
    n_clusters: usize,
    observations: ArrayView2<f64>,
    rng: &mut impl Rng,
) -> Array2<f64> {
    let weights = Array1::ones(observations.nrows());
    weighted_k_means_plusplus(n_clusters, observations, &weights, rng)
}
