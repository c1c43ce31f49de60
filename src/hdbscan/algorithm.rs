use std::cmp::Ordering;

use ndarray::{Array1, ArrayBase, ArrayView2, Data, Ix2};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};
use thiserror::Error;

use super::tree::{single_linkage, CondensedTree, MstEdge};
use super::{HdbscanParams, HdbscanParamsError, HdbscanValidParams};
use crate::distance::{CommonDistance, Distance};
use crate::traits::Fit;

#[derive(Error, Debug)]
pub enum HdbscanError {
    #[error("Invalid hyperparameter: {0}")]
    InvalidParams(#[from] HdbscanParamsError),
    #[error("no observations to cluster")]
    EmptyDataset,
    #[error("observation {0} contains non-finite values")]
    NonFiniteCoordinate(usize),
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
/// HDBSCAN (Hierarchical Density-Based Spatial Clustering of Applications with Noise) finds
/// clusters of varying density and leaves the rows of sparse regions unassigned.
///
/// ## The algorithm
///
/// The core distance of a row is the distance to its `min_samples`-th nearest row, the row
/// itself included. The mutual reachability distance of two rows is the largest of their
/// distance and their two core distances. Rows in sparse regions are pushed away from all
/// others, while rows of dense regions keep their distances.
///
/// A minimum spanning tree over mutual reachability distances gives the full single linkage
/// hierarchy. Walking it from the root, a split is only kept as a new pair of clusters when both
/// sides hold at least `min_cluster_size` rows; smaller sides are rows falling out of a cluster
/// that persists. Each cluster has a stability, the density range over which its rows stay in
/// it, and the flat clustering keeps the clusters that are more stable than their descendants.
///
/// Rows outside of every kept cluster are noise. Every assigned row additionally gets a
/// membership probability in `[0, 1]`, the density at which it left its cluster relative to
/// the densest exit of that cluster. Noise rows have a probability of 0.
///
/// The number of clusters is an outcome of the fit, not a parameter.
///
/// ## Example
///
/// ```
/// use linfa_reasons::hdbscan::Hdbscan;
/// use linfa_reasons::traits::Fit;
/// use ndarray::array;
///
/// let observations = array![
///     [1.5, 2.2], [1.0, 1.1], [1.2, 1.4], [0.8, 1.0], [1.1, 1.0],
///     [3.7, 4.0], [3.9, 3.9], [3.6, 4.1], [3.8, 3.9], [4.0, 4.1],
///     [10.0, 10.0],
/// ];
/// let clusters = Hdbscan::params(5).fit(&observations).unwrap();
///
/// assert_eq!(clusters.n_clusters(), 2);
/// // The last row is noise
/// assert_eq!(clusters.labels()[10], None);
/// ```
pub struct Hdbscan {
    labels: Array1<Option<usize>>,
    probabilities: Array1<f64>,
    n_clusters: usize,
}

impl Hdbscan {
    /// Configure the clustering with the smallest group of rows reported as a cluster
    pub fn params(min_cluster_size: usize) -> HdbscanParams {
        HdbscanParams::new(min_cluster_size)
    }

    /// Cluster index of every row, `None` for noise
    pub fn labels(&self) -> &Array1<Option<usize>> {
        &self.labels
    }

    /// Membership probability of every row
    pub fn probabilities(&self) -> &Array1<f64> {
        &self.probabilities
    }

    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    pub fn n_noise(&self) -> usize {
        self.labels.iter().filter(|label| label.is_none()).count()
    }

    pub fn into_parts(self) -> (Array1<Option<usize>>, Array1<f64>) {
        (self.labels, self.probabilities)
    }

    fn noise(n_samples: usize) -> Self {
        Hdbscan {
            labels: Array1::from_elem(n_samples, None),
            probabilities: Array1::zeros(n_samples),
            n_clusters: 0,
        }
    }
}

impl<D: Data<Elem = f64>> Fit<ArrayBase<D, Ix2>, HdbscanError> for HdbscanValidParams {
    type Object = Hdbscan;

    fn fit(&self, observations: &ArrayBase<D, Ix2>) -> Result<Hdbscan, HdbscanError> {
        let n_samples = observations.nrows();
        if n_samples == 0 {
            return Err(HdbscanError::EmptyDataset);
        }
        if let Some(row) = observations
            .rows()
            .into_iter()
            .position(|row| row.iter().any(|x| !x.is_finite()))
        {
            return Err(HdbscanError::NonFiniteCoordinate(row));
        }
        // Not even the root of the hierarchy is large enough
        if n_samples < self.min_cluster_size() {
            return Ok(Hdbscan::noise(n_samples));
        }

        let observations = observations.view();
        let core_distances = core_distances(observations, self.min_samples(), self.dist_fn());
        let mut mst = prim_mst(observations, &core_distances, self.dist_fn());
        let merges = single_linkage(n_samples, &mut mst);
        let tree = CondensedTree::new(&merges, n_samples, self.min_cluster_size());

        let selected = tree.select_clusters(self.allow_single_cluster());
        let (labels, probabilities) = tree.assign(&selected);

        Ok(Hdbscan {
            labels: Array1::from(labels),
            probabilities: Array1::from(probabilities),
            n_clusters: selected.len(),
        })
    }
}

/// Distance of every row to its `min_samples`-th nearest row, counting the row itself
fn core_distances(
    observations: ArrayView2<f64>,
    min_samples: usize,
    dist_fn: &CommonDistance,
) -> Vec<f64> {
    let n_samples = observations.nrows();
    let k = min_samples.min(n_samples) - 1;
    observations
        .rows()
        .into_iter()
        .map(|row| {
            let mut distances = observations
                .rows()
                .into_iter()
                .map(|other| dist_fn.distance(row, other))
                .collect::<Vec<_>>();
            let (_, kth, _) = distances
                .select_nth_unstable_by(k, |a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
            *kth
        })
        .collect()
}

/// Prim's algorithm over the dense mutual reachability graph
fn prim_mst(
    observations: ArrayView2<f64>,
    core_distances: &[f64],
    dist_fn: &CommonDistance,
) -> Vec<MstEdge> {
    let n_samples = observations.nrows();
    let mut in_tree = vec![false; n_samples];
    let mut distances = vec![f64::INFINITY; n_samples];
    let mut nearest = vec![0; n_samples];
    let mut mst = Vec::with_capacity(n_samples - 1);

    let mut current = 0;
    for _ in 1..n_samples {
        in_tree[current] = true;
        let mut next = None;
        let mut next_distance = f64::INFINITY;

        for other in 0..n_samples {
            if in_tree[other] {
                continue;
            }
            let reachability = dist_fn
                .distance(observations.row(current), observations.row(other))
                .max(core_distances[current])
                .max(core_distances[other]);
            if reachability < distances[other] {
                distances[other] = reachability;
                nearest[other] = current;
            }
            if next.is_none() || distances[other] < next_distance {
                next = Some(other);
                next_distance = distances[other];
            }
        }

        match next {
            Some(other) => {
                mst.push(MstEdge {
                    left: nearest[other],
                    right: other,
                    distance: next_distance,
                });
                current = other;
            }
            None => break,
        }
    }
    mst
}
