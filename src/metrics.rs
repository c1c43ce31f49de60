//! Cluster quality
use std::collections::HashMap;

use ndarray::ArrayView1;

use crate::cluster::ClusterResult;
use crate::distance::{Distance, L2Dist};
use crate::error::{Error, Result};
use crate::matrix::FeatureMatrix;

struct DistanceCount {
    total_distance: f64,
    count: usize,
}

impl DistanceCount {
    /// Sets the total distance from the sample to this cluster to zero
    pub fn reset(&mut self) {
        self.total_distance = 0.;
    }

    pub fn new(count: usize) -> DistanceCount {
        DistanceCount {
            total_distance: 0.,
            count,
        }
    }

    /// Divides the total distance from the sample to this cluster by the number of samples in the cluster
    pub fn mean_distance(&self) -> f64 {
        self.total_distance / self.count as f64
    }

    /// The distance of the sample to itself is zero and is not counted
    pub fn same_label_mean_distance(&self) -> f64 {
        if self.count == 1 {
            return 0.;
        }
        self.total_distance / (self.count - 1) as f64
    }

    pub fn add_point(&mut self, eval_sample: ArrayView1<f64>, other_sample: ArrayView1<f64>) {
        self.total_distance += L2Dist.distance(eval_sample, other_sample);
    }
}

/// Evaluates the quality of a clustering using euclidean distance.
///
/// The silhouette score of a row is the relative difference between the mean distance of the
/// row to the other rows of its cluster and the smallest mean distance to the rows of another
/// cluster. It goes from -1 to +1 when the row is respectively closer (in average) to rows of
/// another cluster and to rows of its own cluster. The score of the clustering is the mean
/// over the rows.
///
/// Noise rows are left out. A row alone in its cluster scores 0. A clustering with a single
/// cluster scores 1.
pub fn silhouette_score(matrix: &FeatureMatrix, result: &ClusterResult) -> Result<f64> {
    if matrix.nsamples() != result.nsamples() {
        return Err(Error::RowMismatch {
            expected: matrix.nsamples(),
            found: result.nsamples(),
        });
    }

    let assignments = result.assignments();
    let samples = matrix
        .records()
        .rows()
        .into_iter()
        .zip(assignments.iter().copied())
        .filter_map(|(row, label)| label.map(|label| (row, label)))
        .collect::<Vec<_>>();
    if samples.is_empty() {
        return Err(Error::EmptyInput);
    }

    let mut labels: HashMap<usize, DistanceCount> = HashMap::new();
    for (_, label) in &samples {
        labels
            .entry(*label)
            .or_insert_with(|| DistanceCount::new(0))
            .count += 1;
    }
    // Single label, all rows are in the same cluster
    if labels.len() == 1 {
        return Ok(1.);
    }

    let score = samples
        .iter()
        .map(|(sample, sample_label)| {
            for (other, other_label) in &samples {
                if let Some(counter) = labels.get_mut(other_label) {
                    counter.add_point(*sample, *other);
                }
            }

            // average distance from `sample` to rows of its cluster
            let mut a_x = 0.;
            // minimum average distance from `sample` to another cluster
            let mut b_x = f64::INFINITY;
            let mut singleton = false;
            for (label, counter) in labels.iter_mut() {
                if label == sample_label {
                    a_x = counter.same_label_mean_distance();
                    singleton = counter.count == 1;
                } else {
                    b_x = b_x.min(counter.mean_distance());
                }
                counter.reset()
            }

            // s(x) = (b(x) - a(x)) / max{a(x), b(x)}, and 0 for the only row of a cluster
            let max = a_x.max(b_x);
            if singleton {
                0.
            } else if max > 0. {
                (b_x - a_x) / max
            } else {
                0.
            }
        })
        .sum::<f64>();
    Ok(score / samples.len() as f64)
}
